//! End-to-end run: raw tables in, scored routes and a failure manifest out.

use geo::Coord;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::aggregator::{MetricSources, join, parse_static, score_all};
use crate::derive::compliance::{ItineraryCompliance, derive_executed_km};
use crate::derive::frequency::derive_frequency;
use crate::derive::punctuality::derive_punctuality;
use crate::derive::stop_spacing::derive_stop_spacing;
use crate::derive::{MetricTable, RouteMetric, RowIssue, parse_number};
use crate::error::{ComputationError, ParseError};
use crate::geometry::linker::STOP_PROXIMITY_THRESHOLD_M;
use crate::geometry::{Crs, PointLayer};
use crate::indicators::iqt::evaluate;
use crate::indicators::types::{
    Indicator, IqtResult, RouteFailure, RouteMetricRecord, ScoreRow,
};
use crate::input::{
    ComplianceRow, PointRow, PunctualityRow, SCORE_MATRIX_SOURCE, ScoreMatrixRow,
    StaticAttributesRow, TripLogRow,
};
use crate::route::RouteKey;

/// Everything a scoring run reads. Only the static table is mandatory.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub static_attributes: Vec<StaticAttributesRow>,
    pub trips: Option<Vec<TripLogRow>>,
    pub punctuality: Option<Vec<PunctualityRow>>,
    pub compliance: Option<Vec<ComplianceRow>>,
    pub stops: Option<Vec<PointRow>>,
    pub geometry_crs: Crs,
    pub points_crs: Crs,
    pub by_direction: bool,
    /// Records dropped while reading the sources.
    pub issues: Vec<RowIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub records: Vec<RouteMetricRecord>,
    pub results: Vec<IqtResult>,
    pub failures: Vec<RouteFailure>,
    pub issues: Vec<RowIssue>,
}

/// Parses stop rows into a planar layer. Rows with unreadable or
/// out-of-range coordinates are skipped and reported.
pub fn load_points(rows: &[PointRow], crs: Crs) -> Result<(PointLayer, Vec<RowIssue>), ParseError> {
    let mut issues = Vec::new();
    let mut coords = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let parsed = parse_number(&row.longitude).and_then(|x| {
            let y = parse_number(&row.latitude)?;
            crs.project(Coord { x, y })?;
            Ok((row.id.trim().to_string(), x, y))
        });
        match parsed {
            Ok(point) => coords.push(point),
            Err(e) => issues.push(RowIssue::new(PointRow::SOURCE, idx, e)),
        }
    }

    Ok((PointLayer::from_coords(coords, crs)?, issues))
}

/// Scores every route of the static table.
#[tracing::instrument(skip_all, fields(routes = inputs.static_attributes.len()))]
pub fn run(inputs: &PipelineInputs) -> PipelineReport {
    let statics = parse_static(&inputs.static_attributes, inputs.geometry_crs, inputs.by_direction);
    let mut issues = inputs.issues.clone();
    issues.extend(statics.issues.iter().cloned());
    let geometries = statics.geometries();

    let punctuality = inputs.punctuality.as_deref().map(derive_punctuality);
    let frequency = inputs.trips.as_deref().map(derive_frequency);
    let itinerary = inputs
        .compliance
        .as_deref()
        .map(|rows| ItineraryCompliance::new(derive_executed_km(rows), &geometries));
    let stop_spacing = match inputs.stops.as_deref().map(|rows| load_points(rows, inputs.points_crs)) {
        Some(Ok((layer, point_issues))) => {
            issues.extend(point_issues);
            Some(derive_stop_spacing(&geometries, &layer, STOP_PROXIMITY_THRESHOLD_M))
        }
        Some(Err(e)) => {
            warn!(error = %e, "Stop layer unusable, stop spacing falls back to static values");
            issues.push(RowIssue::new(PointRow::SOURCE, 0, e));
            None
        }
        None => None,
    };

    let tables: [Option<&MetricTable>; 4] = [
        punctuality.as_ref(),
        frequency.as_ref(),
        itinerary.as_ref().map(ItineraryCompliance::executed),
        stop_spacing.as_ref(),
    ];
    for table in tables.into_iter().flatten() {
        for key in table.unavailable() {
            warn!(route = %key, "Route has rows but no usable value in a source");
        }
        issues.extend(table.issues.iter().cloned());
    }

    let sources = MetricSources {
        punctuality: punctuality.as_ref().map(|t| t as &(dyn RouteMetric + Sync)),
        frequency: frequency.as_ref().map(|t| t as &(dyn RouteMetric + Sync)),
        itinerary: itinerary.as_ref().map(|t| t as &(dyn RouteMetric + Sync)),
        stop_spacing: stop_spacing.as_ref().map(|t| t as &(dyn RouteMetric + Sync)),
    };
    let records = join(&statics.rows, &sources);
    let (results, failures) = evaluate_rows(score_all(&records));

    info!(
        scored = results.len(),
        failed = failures.len(),
        row_issues = issues.len(),
        "Pipeline finished"
    );

    PipelineReport {
        records,
        results,
        failures,
        issues,
    }
}

/// IQT for each row; rows that fail are moved to the failure list.
pub fn evaluate_rows(rows: Vec<ScoreRow>) -> (Vec<IqtResult>, Vec<RouteFailure>) {
    let evaluated: Vec<(RouteKey, Result<IqtResult, ComputationError>)> = rows
        .into_par_iter()
        .map(|row| (row.key.clone(), evaluate(row)))
        .collect();

    let mut results = Vec::with_capacity(evaluated.len());
    let mut failures = Vec::new();
    for (key, outcome) in evaluated {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(route = %key, error = %e, "Could not compute IQT");
                failures.push(RouteFailure::new(&key, e));
            }
        }
    }
    (results, failures)
}

fn matrix_row(row: &ScoreMatrixRow) -> Result<ScoreRow, ComputationError> {
    let values = row
        .cells
        .iter()
        .zip(Indicator::ALL)
        .map(|(cell, indicator)| {
            parse_number(cell).map_err(|_: ParseError| ComputationError::NotOrdinal {
                indicator: indicator.code(),
                value: cell.clone(),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;
    ScoreRow::from_values(row.key.clone(), &values)
}

/// Recomputes IQT from a precomputed score matrix.
#[tracing::instrument(skip_all, fields(source = SCORE_MATRIX_SOURCE, rows = rows.len()))]
pub fn evaluate_matrix(rows: Vec<ScoreMatrixRow>) -> (Vec<IqtResult>, Vec<RouteFailure>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut failures = Vec::new();
    for row in &rows {
        match matrix_row(row) {
            Ok(scores) => valid.push(scores),
            Err(e) => {
                warn!(route = %row.key, error = %e, "Skipping malformed score row");
                failures.push(RouteFailure::new(&row.key, e));
            }
        }
    }

    let (results, mut evaluation_failures) = evaluate_rows(valid);
    failures.append(&mut evaluation_failures);
    (results, failures)
}
