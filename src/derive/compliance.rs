//! Itinerary compliance: executed distance over planned route length.

use std::collections::BTreeMap;

use crate::derive::trajectory::parse_trajectory;
use crate::derive::{MetricTable, RouteMetric, parse_number};
use crate::error::ParseError;
use crate::geometry::RouteGeometry;
use crate::indicators::utility::mean;
use crate::input::ComplianceRow;
use crate::route::RouteKey;

/// Mean executed kilometres per route and direction.
pub fn derive_executed_km(rows: &[ComplianceRow]) -> MetricTable {
    let mut table = MetricTable::new(ComplianceRow::SOURCE);

    for (idx, row) in rows.iter().enumerate() {
        let key = match parse_trajectory(&row.trajeto) {
            Ok(key) => key,
            Err(e) => {
                table.reject(idx, None, e);
                continue;
            }
        };
        match parse_number(row.km_executado.as_deref().unwrap_or("")) {
            Ok(km) if km >= 0.0 => table.push(key, km),
            Ok(km) => table.reject(idx, Some(key), ParseError::Number(km.to_string())),
            Err(e) => table.reject(idx, Some(key), e),
        }
    }

    table
}

/// Executed/planned ratio per route key.
#[derive(Debug, Clone)]
pub struct ItineraryCompliance {
    executed_km: MetricTable,
    planned_km: BTreeMap<RouteKey, f64>,
}

impl ItineraryCompliance {
    pub fn new(executed_km: MetricTable, geometries: &[RouteGeometry]) -> Self {
        let planned_km = geometries
            .iter()
            .map(|g| (g.key.clone(), g.length_km()))
            .collect();
        Self {
            executed_km,
            planned_km,
        }
    }

    pub fn executed(&self) -> &MetricTable {
        &self.executed_km
    }

    /// Planned length for `key`; a route-level key averages its directions.
    pub fn planned_km(&self, key: &RouteKey) -> Option<f64> {
        if let Some(km) = self.planned_km.get(key) {
            return Some(*km);
        }
        match key.direction {
            None => {
                let lengths: Vec<f64> = self
                    .planned_km
                    .iter()
                    .filter(|(k, _)| k.route == key.route)
                    .map(|(_, km)| *km)
                    .collect();
                (!lengths.is_empty()).then(|| mean(&lengths))
            }
            Some(_) => self.planned_km.get(&key.without_direction()).copied(),
        }
    }
}

impl RouteMetric for ItineraryCompliance {
    fn name(&self) -> &str {
        "itinerary_compliance"
    }

    fn value(&self, key: &RouteKey) -> Option<f64> {
        let executed = self.executed_km.value(key)?;
        let planned = self.planned_km(key).filter(|km| *km > 0.0)?;
        Some(executed / planned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Crs;
    use crate::route::Direction;

    fn row(trajeto: &str, km: &str) -> ComplianceRow {
        ComplianceRow {
            trajeto: trajeto.into(),
            km_executado: Some(km.into()),
        }
    }

    fn ten_km(key: RouteKey) -> RouteGeometry {
        RouteGeometry::from_wkt(key, "LINESTRING (0 0, 10000 0)", Crs::WebMercator).unwrap()
    }

    #[test]
    fn test_ratio_against_geometry_length() {
        let rows = vec![row("1702 - A (ida)", "9"), row("1702 - A (volta)", "10,0")];
        let compliance = ItineraryCompliance::new(
            derive_executed_km(&rows),
            &[ten_km(RouteKey::route("1702"))],
        );

        let ratio = compliance.value(&RouteKey::route("1702")).unwrap();
        assert!((ratio - 0.95).abs() < 1e-12);
        let outbound = compliance
            .value(&RouteKey::new("1702", Some(Direction::Outbound)))
            .unwrap();
        assert!((outbound - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_missing_geometry_is_unavailable() {
        let rows = vec![row("1702 - A (ida)", "9")];
        let compliance = ItineraryCompliance::new(derive_executed_km(&rows), &[]);
        assert_eq!(compliance.value(&RouteKey::route("1702")), None);
    }

    #[test]
    fn test_zero_length_geometry_is_unavailable() {
        let rows = vec![row("5 - A (ida)", "9")];
        let geometry =
            RouteGeometry::from_wkt(RouteKey::route("5"), "LINESTRING (3 3, 3 3)", Crs::WebMercator)
                .unwrap();
        let compliance = ItineraryCompliance::new(derive_executed_km(&rows), &[geometry]);
        assert_eq!(compliance.value(&RouteKey::route("5")), None);
    }

    #[test]
    fn test_bad_km_values_are_skipped() {
        let rows = vec![row("5 - A (ida)", "abc"), row("5 - A (ida)", "-3"), row("5 - A (ida)", "4")];
        let table = derive_executed_km(&rows);
        assert_eq!(table.issues.len(), 2);
        assert_eq!(table.value(&RouteKey::route("5")), Some(4.0));
    }
}
