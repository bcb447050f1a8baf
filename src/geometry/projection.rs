//! Coordinate reference systems and reprojection to the working planar CRS.
//!
//! All distance and length arithmetic happens in EPSG:3857 (spherical Web
//! Mercator) metres. [`Planar`] can only be built by [`Crs::to_planar`], so
//! geographic degrees never reach a length computation.

use geo::{Coord, MapCoords};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// WGS84 semi-major axis used by the spherical Mercator projection.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Metres per degree of longitude on the equator of the projection sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * PI / 180.0;

/// Latitude limit of EPSG:3857.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

const MAX_MERCATOR_EXTENT: f64 = EARTH_RADIUS_M * PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic longitude/latitude in degrees.
    #[default]
    #[serde(rename = "EPSG:4326")]
    Wgs84,
    /// Spherical Web Mercator, metres.
    #[serde(rename = "EPSG:3857")]
    WebMercator,
}

impl Crs {
    pub fn code(&self) -> &'static str {
        match self {
            Crs::Wgs84 => "EPSG:4326",
            Crs::WebMercator => "EPSG:3857",
        }
    }

    /// Projects one coordinate expressed in `self` into EPSG:3857.
    pub fn project(&self, c: Coord<f64>) -> Result<Coord<f64>, ParseError> {
        let out_of_range = || ParseError::Coordinate {
            x: c.x,
            y: c.y,
            crs: self.code(),
        };
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(out_of_range());
        }
        match self {
            Crs::Wgs84 => {
                if c.x.abs() > 180.0 || c.y.abs() > MAX_MERCATOR_LATITUDE {
                    return Err(out_of_range());
                }
                let x = c.x.to_radians() * EARTH_RADIUS_M;
                let y = (PI / 4.0 + c.y.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M;
                Ok(Coord { x, y })
            }
            Crs::WebMercator => {
                if c.x.abs() > MAX_MERCATOR_EXTENT || c.y.abs() > MAX_MERCATOR_EXTENT {
                    return Err(out_of_range());
                }
                Ok(c)
            }
        }
    }

    /// Reprojects a whole geometry into EPSG:3857.
    pub fn to_planar<G>(&self, geometry: G) -> Result<Planar<G>, ParseError>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        let projected = geometry.try_map_coords(|c| self.project(c))?;
        Ok(Planar(projected))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Crs {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EPSG:4326" | "4326" | "WGS84" => Ok(Crs::Wgs84),
            "EPSG:3857" | "3857" | "WEBMERCATOR" => Ok(Crs::WebMercator),
            _ => Err(ParseError::Crs(s.to_string())),
        }
    }
}

/// A geometry whose coordinates are EPSG:3857 metres.
#[derive(Debug, Clone, PartialEq)]
pub struct Planar<G>(G);

impl<G> Planar<G> {
    pub fn inner(&self) -> &G {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, line_string};

    #[test]
    fn origin_maps_to_origin() {
        let c = Crs::Wgs84.project(Coord { x: 0.0, y: 0.0 }).unwrap();
        assert!(c.x.abs() < 1e-9 && c.y.abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_on_the_equator() {
        let c = Crs::Wgs84.project(Coord { x: 1.0, y: 0.0 }).unwrap();
        assert!((c.x - METERS_PER_DEGREE).abs() < 1e-6);
        assert!((METERS_PER_DEGREE - 111_319.490_793).abs() < 1e-3);
    }

    #[test]
    fn mercator_input_is_left_untouched() {
        let p = Crs::WebMercator.to_planar(Point::new(1000.0, -2000.0)).unwrap();
        assert_eq!(p.inner(), &Point::new(1000.0, -2000.0));
    }

    #[test]
    fn polar_latitudes_are_rejected() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 89.0)];
        assert!(Crs::Wgs84.to_planar(line).is_err());
    }

    #[test]
    fn parses_epsg_codes() {
        assert_eq!("EPSG:4326".parse::<Crs>(), Ok(Crs::Wgs84));
        assert_eq!("epsg:3857".parse::<Crs>(), Ok(Crs::WebMercator));
        assert!("EPSG:31983".parse::<Crs>().is_err());
    }
}
