//! Mean distance between consecutive stops served by a route.
//!
//! Route vertices are linked to their nearest stop; links farther than the
//! proximity threshold are dropped. The remaining stop sequence, with
//! consecutive repeats collapsed, gives the gaps whose mean is the metric.

use geo::{Distance, Euclidean};

use crate::derive::MetricTable;
use crate::error::ParseError;
use crate::geometry::linker::link_within;
use crate::geometry::{PointLayer, RouteGeometry};

pub const SOURCE: &str = "stop_spacing";

/// Stops served by `geometry`, in drawing order, without consecutive repeats.
pub fn served_stops(geometry: &RouteGeometry, stops: &PointLayer, threshold_m: f64) -> Vec<usize> {
    let vertices = geometry.vertices();
    let Ok(links) = link_within(&vertices, &stops.points, threshold_m) else {
        return Vec::new();
    };

    let mut sequence: Vec<usize> = Vec::new();
    for link in links {
        if sequence.last() != Some(&link.target) {
            sequence.push(link.target);
        }
    }
    sequence
}

pub fn derive_stop_spacing(
    geometries: &[RouteGeometry],
    stops: &PointLayer,
    threshold_m: f64,
) -> MetricTable {
    let mut table = MetricTable::new(SOURCE);

    for (idx, geometry) in geometries.iter().enumerate() {
        let sequence = served_stops(geometry, stops, threshold_m);
        if sequence.len() < 2 {
            table.reject(
                idx,
                Some(geometry.key.clone()),
                ParseError::Geometry(format!(
                    "route {} passes near {} stop(s), at least 2 are needed",
                    geometry.key,
                    sequence.len()
                )),
            );
            continue;
        }

        let points = stops.points();
        for pair in sequence.windows(2) {
            let gap = Euclidean.distance(points[pair[0]], points[pair[1]]);
            table.push(geometry.key.clone(), gap);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::RouteMetric;
    use crate::geometry::Crs;
    use crate::geometry::linker::STOP_PROXIMITY_THRESHOLD_M;
    use crate::route::RouteKey;

    fn stops(coords: &[(f64, f64)]) -> PointLayer {
        PointLayer::from_coords(
            coords
                .iter()
                .enumerate()
                .map(|(i, (x, y))| (i.to_string(), *x, *y)),
            Crs::WebMercator,
        )
        .unwrap()
    }

    fn route(wkt: &str) -> RouteGeometry {
        RouteGeometry::from_wkt(RouteKey::route("1"), wkt, Crs::WebMercator).unwrap()
    }

    #[test]
    fn test_mean_gap_between_served_stops() {
        let layer = stops(&[(0.0, 0.0), (300.0, 0.0), (900.0, 0.0), (5000.0, 5000.0)]);
        let geometry = route("LINESTRING (0 0, 150 0, 300 0, 600 0, 900 0)");

        assert_eq!(served_stops(&geometry, &layer, STOP_PROXIMITY_THRESHOLD_M), vec![0, 1, 2]);
        let table = derive_stop_spacing(&[geometry], &layer, STOP_PROXIMITY_THRESHOLD_M);
        assert_eq!(table.value(&RouteKey::route("1")), Some(450.0));
    }

    #[test]
    fn test_far_vertices_are_ignored() {
        let layer = stops(&[(0.0, 0.0), (200.0, 0.0)]);
        let geometry = route("LINESTRING (0 0, 200 0, 200 3000)");
        let table = derive_stop_spacing(&[geometry], &layer, STOP_PROXIMITY_THRESHOLD_M);
        assert_eq!(table.value(&RouteKey::route("1")), Some(200.0));
    }

    #[test]
    fn test_single_stop_is_unavailable() {
        let layer = stops(&[(0.0, 0.0)]);
        let geometry = route("LINESTRING (0 0, 10 0, 20 0)");
        let table = derive_stop_spacing(&[geometry], &layer, STOP_PROXIMITY_THRESHOLD_M);
        assert_eq!(table.value(&RouteKey::route("1")), None);
        assert_eq!(table.issues.len(), 1);
    }

    #[test]
    fn test_no_stops_at_all() {
        let layer = stops(&[]);
        let geometry = route("LINESTRING (0 0, 10 0)");
        let table = derive_stop_spacing(&[geometry], &layer, STOP_PROXIMITY_THRESHOLD_M);
        assert!(table.is_empty());
    }
}
