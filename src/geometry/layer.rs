//! WKT geometry layers: route lines, area polygons and point sets.

use geo::{
    Coord, Euclidean, Geometry, Length, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point,
};
use wkt::TryFromWkt;

use super::projection::{Crs, Planar};
use crate::error::ParseError;
use crate::route::RouteKey;

pub const METERS_PER_KM: f64 = 1000.0;

/// A parsed and reprojected WKT feature.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanarGeometry {
    Path(Planar<MultiLineString<f64>>),
    Area(Planar<MultiPolygon<f64>>),
}

/// Parses a WKT string declared in `crs` and reprojects it to EPSG:3857.
///
/// Lines and polygons are accepted (single or multi); Z values are dropped.
pub fn parse_wkt(wkt: &str, crs: Crs) -> Result<PlanarGeometry, ParseError> {
    let geometry = Geometry::<f64>::try_from_wkt_str(wkt.trim())
        .map_err(|e| ParseError::Geometry(e.to_string()))?;

    match geometry {
        Geometry::LineString(ls) => {
            let lines = MultiLineString::new(vec![ls]);
            Ok(PlanarGeometry::Path(crs.to_planar(lines)?))
        }
        Geometry::MultiLineString(mls) => Ok(PlanarGeometry::Path(crs.to_planar(mls)?)),
        Geometry::Polygon(p) => {
            let polygons = MultiPolygon::new(vec![p]);
            Ok(PlanarGeometry::Area(crs.to_planar(polygons)?))
        }
        Geometry::MultiPolygon(mp) => Ok(PlanarGeometry::Area(crs.to_planar(mp)?)),
        other => Err(ParseError::Geometry(format!(
            "expected a line or polygon, found {}",
            geometry_name(&other)
        ))),
    }
}

fn geometry_name(g: &Geometry<f64>) -> &'static str {
    match g {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) => "LINE",
        Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) => "RECT",
        Geometry::Triangle(_) => "TRIANGLE",
    }
}

/// Planned path of one route (or one direction of a route).
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    pub key: RouteKey,
    pub path: Planar<MultiLineString<f64>>,
}

impl RouteGeometry {
    pub fn from_wkt(key: RouteKey, wkt: &str, crs: Crs) -> Result<Self, ParseError> {
        match parse_wkt(wkt, crs)? {
            PlanarGeometry::Path(path) => Ok(Self { key, path }),
            PlanarGeometry::Area(_) => Err(ParseError::Geometry(format!(
                "route {key} has a polygon geometry, expected a line"
            ))),
        }
    }

    /// Planar length in kilometres (EPSG:3857 metres / 1000).
    pub fn length_km(&self) -> f64 {
        let meters: f64 = self
            .path
            .inner()
            .0
            .iter()
            .map(|ls: &LineString<f64>| Euclidean.length(ls))
            .sum();
        meters / METERS_PER_KM
    }

    /// Vertices of every part, in drawing order.
    pub fn vertices(&self) -> Vec<Point<f64>> {
        self.path
            .inner()
            .0
            .iter()
            .flat_map(|ls| ls.points())
            .collect()
    }
}

/// A named point set (stops, residences) reprojected to EPSG:3857.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLayer {
    pub ids: Vec<String>,
    pub points: Planar<MultiPoint<f64>>,
}

impl PointLayer {
    pub fn from_coords(
        rows: impl IntoIterator<Item = (String, f64, f64)>,
        crs: Crs,
    ) -> Result<Self, ParseError> {
        let mut ids = Vec::new();
        let mut points = Vec::new();
        for (id, x, y) in rows {
            ids.push(id);
            points.push(Point::from(Coord { x, y }));
        }
        Ok(Self {
            ids,
            points: crs.to_planar(MultiPoint::new(points))?,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn points(&self) -> &[Point<f64>] {
        &self.points.inner().0
    }
}
