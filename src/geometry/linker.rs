//! Brute-force Euclidean nearest-neighbour linking between point sets.
//!
//! Both inputs must share one planar CRS. The thresholded variant only
//! accepts [`Planar`] inputs, so its metre threshold is always meaningful.

use geo::{Distance, Euclidean, MultiPoint, Point};
use rayon::prelude::*;
use serde::Serialize;

use super::projection::{METERS_PER_DEGREE, Planar};
use crate::error::LinkError;

/// Vertex-to-stop proximity threshold, in EPSG:3857 metres.
///
/// Historically 0.002 geographic degrees; converted with the equatorial
/// metres-per-degree of the projection sphere (≈ 222.64 m).
pub const STOP_PROXIMITY_THRESHOLD_M: f64 = 0.002 * METERS_PER_DEGREE;

/// For each origin point, the nearest target index and its distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Links {
    pub pontos: Vec<usize>,
    pub distancias: Vec<f64>,
}

/// A single accepted origin → target link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub origin: usize,
    pub target: usize,
    pub distance: f64,
}

/// Nearest target for one origin. Ties go to the lowest index.
fn nearest(origin: Point<f64>, targets: &[Point<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, target) in targets.iter().enumerate() {
        let d = Euclidean.distance(origin, *target);
        if d < best.1 {
            best = (idx, d);
        }
    }
    best
}

/// Links every point of `origins` to its nearest point in `targets`.
///
/// O(|origins| · |targets|); the outer loop runs on the rayon pool and the
/// output keeps the order of `origins`.
pub fn link(origins: &[Point<f64>], targets: &[Point<f64>]) -> Result<Links, LinkError> {
    if targets.is_empty() {
        return Err(LinkError::EmptyTarget);
    }

    let (pontos, distancias) = origins
        .par_iter()
        .map(|origin| nearest(*origin, targets))
        .unzip();

    Ok(Links { pontos, distancias })
}

/// Links each vertex to its nearest stop, keeping only links within
/// `threshold_m` metres.
pub fn link_within(
    vertices: &[Point<f64>],
    stops: &Planar<MultiPoint<f64>>,
    threshold_m: f64,
) -> Result<Vec<Link>, LinkError> {
    let links = link(vertices, &stops.inner().0)?;

    Ok(links
        .pontos
        .into_iter()
        .zip(links.distancias)
        .enumerate()
        .filter(|(_, (_, distance))| *distance <= threshold_m)
        .map(|(origin, (target, distance))| Link {
            origin,
            target,
            distance,
        })
        .collect())
}
