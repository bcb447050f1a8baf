//! Line aggregation: one row per route key, ready for scoring.
//!
//! The static-attributes table is the backbone of a left join. Every route
//! it lists appears in the output; a metric source that has nothing for a
//! route contributes `None`, which scores 0.

use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::derive::{RouteMetric, RowIssue, parse_optional_number};
use crate::geometry::{Crs, RouteGeometry};
use crate::indicators::scorer::score_record;
use crate::indicators::types::{RouteMetricRecord, ScoreRow};
use crate::input::StaticAttributesRow;
use crate::route::{Direction, RouteKey};

/// Parsed operator-maintained attributes of one route key.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticAttributes {
    pub key: RouteKey,
    pub pavement: Option<f64>,
    pub integration: Option<String>,
    pub training: Option<f64>,
    pub info_availability: Option<String>,
    pub fare_trend: Option<String>,
    pub network_coverage: Option<f64>,
    pub stop_spacing_m: Option<f64>,
    pub geometry: Option<RouteGeometry>,
}

/// The backbone table after parsing, plus whatever had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct StaticTable {
    pub rows: Vec<StaticAttributes>,
    pub issues: Vec<RowIssue>,
}

impl StaticTable {
    /// Route geometries carried by the static rows.
    pub fn geometries(&self) -> Vec<RouteGeometry> {
        self.rows.iter().filter_map(|r| r.geometry.clone()).collect()
    }
}

fn text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parses the static rows. When `by_direction` is false the `sentido`
/// column is ignored and routes are keyed by id only. Duplicate keys keep
/// the first row.
pub fn parse_static(rows: &[StaticAttributesRow], crs: Crs, by_direction: bool) -> StaticTable {
    let source = StaticAttributesRow::SOURCE;
    let mut table = StaticTable::default();
    let mut seen: HashSet<RouteKey> = HashSet::new();

    for (idx, row) in rows.iter().enumerate() {
        if row.linha.trim().is_empty() {
            table.issues.push(RowIssue::new(source, idx, "empty route id"));
            continue;
        }

        let direction = if by_direction {
            match Direction::parse_code(row.sentido.as_deref().unwrap_or("")) {
                Ok(d) => d,
                Err(e) => {
                    table.issues.push(RowIssue::new(source, idx, e));
                    None
                }
            }
        } else {
            None
        };
        let key = RouteKey::new(&row.linha, direction);

        if !seen.insert(key.clone()) {
            warn!(route = %key, row = idx + 1, "Duplicate static attributes row, keeping the first");
            continue;
        }

        let mut number = |raw: &Option<String>| match parse_optional_number(raw.as_deref()) {
            Ok(v) => v,
            Err(e) => {
                table.issues.push(RowIssue::new(source, idx, e));
                None
            }
        };
        let pavement = number(&row.via_pavimentada);
        let training = number(&row.treinamento_motorista);
        let network_coverage = number(&row.abrangencia);
        let stop_spacing_m = number(&row.distancia);

        let geometry = match text(&row.geometry) {
            Some(wkt) => match RouteGeometry::from_wkt(key.clone(), &wkt, crs) {
                Ok(g) => Some(g),
                Err(e) => {
                    table.issues.push(RowIssue::new(source, idx, e));
                    None
                }
            },
            None => None,
        };

        table.rows.push(StaticAttributes {
            key,
            pavement,
            integration: text(&row.integracao),
            training,
            info_availability: text(&row.informacao_internet),
            fare_trend: text(&row.valor_tarifa),
            network_coverage,
            stop_spacing_m,
            geometry,
        });
    }

    table
}

/// Metric sources joined onto the static backbone. Absent sources read as
/// missing for every route.
#[derive(Default)]
pub struct MetricSources<'a> {
    pub punctuality: Option<&'a (dyn RouteMetric + Sync)>,
    pub frequency: Option<&'a (dyn RouteMetric + Sync)>,
    pub itinerary: Option<&'a (dyn RouteMetric + Sync)>,
    pub stop_spacing: Option<&'a (dyn RouteMetric + Sync)>,
}

fn lookup(source: Option<&(dyn RouteMetric + Sync)>, key: &RouteKey) -> Option<f64> {
    let source = source?;
    let value = source.value(key);
    if value.is_none() {
        debug!(source = source.name(), route = %key, "No metric for route");
    }
    value
}

/// Left join: one record per static row, in static-table order.
pub fn join(statics: &[StaticAttributes], sources: &MetricSources<'_>) -> Vec<RouteMetricRecord> {
    statics
        .iter()
        .map(|s| RouteMetricRecord {
            key: s.key.clone(),
            pavement: s.pavement,
            stop_spacing_m: lookup(sources.stop_spacing, &s.key).or(s.stop_spacing_m),
            integration: s.integration.clone(),
            punctuality: lookup(sources.punctuality, &s.key),
            interval_minutes: lookup(sources.frequency, &s.key),
            itinerary_ratio: lookup(sources.itinerary, &s.key),
            network_coverage: s.network_coverage,
            training: s.training,
            info_availability: s.info_availability.clone(),
            fare_trend: s.fare_trend.clone(),
        })
        .collect()
}

/// Scores every joined record. Order is preserved.
pub fn score_all(records: &[RouteMetricRecord]) -> Vec<ScoreRow> {
    records.par_iter().map(score_record).collect()
}
