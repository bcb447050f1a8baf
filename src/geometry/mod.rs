//! Planar geometry: reprojection, WKT layers and nearest-point linking.

pub mod layer;
pub mod linker;
pub mod projection;

pub use layer::{PointLayer, RouteGeometry};
pub use projection::{Crs, Planar};
