//! Coordinate reference handling: WGS84 and UTM zones, with a pure-Rust
//! transverse Mercator projection (Snyder 1987, USGS formulas). Covers
//! EPSG 326xx (UTM North) and 327xx (UTM South), which is all the pipeline
//! needs for its metric frames. No libproj dependency.

use std::fmt;

use geo::{Coord, MapCoords};

use crate::Error;

// WGS84 ellipsoid constants
const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A coordinate reference frame carried by every spatial artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// Geographic coordinates, EPSG:4326
    Wgs84,
    /// Projected metric frame, EPSG 326xx (north) or 327xx (south)
    Utm { zone: u8, north: bool },
}

impl Crs {
    /// Parse an EPSG code. Only WGS84 and the UTM zone codes are supported.
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 => Some(Self::Wgs84),
            32601..=32660 => Some(Self::Utm {
                zone: (epsg - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Some(Self::Utm {
                zone: (epsg - 32700) as u8,
                north: false,
            }),
            _ => None,
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Utm { zone, north: true } => 32600 + u32::from(*zone),
            Self::Utm { zone, north: false } => 32700 + u32::from(*zone),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Wgs84)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Pick the UTM frame covering a WGS84 location.
pub fn estimate_utm(lon: f64, lat: f64) -> Crs {
    let zone = (((lon + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8;
    Crs::Utm {
        zone,
        north: lat >= 0.0,
    }
}

/// Reproject a coordinate between the supported frames.
pub fn transform_coord(c: Coord<f64>, from: Crs, to: Crs) -> Coord<f64> {
    if from == to {
        return c;
    }

    // Route everything through geographic coordinates.
    let (lon, lat) = match from {
        Crs::Wgs84 => (c.x, c.y),
        Crs::Utm { zone, north } => utm_to_wgs84(c.x, c.y, zone, north),
    };

    match to {
        Crs::Wgs84 => Coord { x: lon, y: lat },
        Crs::Utm { zone, north } => {
            let (e, n) = wgs84_to_utm(lon, lat, zone, north);
            Coord { x: e, y: n }
        }
    }
}

/// Reproject any geo geometry between the supported frames.
pub fn project<G>(geometry: &G, from: Crs, to: Crs) -> G::Output
where
    G: MapCoords<f64, f64>,
{
    geometry.map_coords(|c| transform_coord(c, from, to))
}

/// Convenience check used before combining two datasets.
pub fn require_same_frame(expected: Crs, found: Crs) -> Result<(), Error> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::CrsMismatch { expected, found })
    }
}

// Core projection (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64)

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting, northing)
/// in metres for the given zone and hemisphere.
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u8, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Easting (Snyder eq. 8-9)
    let easting = K0 * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Northing (Snyder eq. 8-10)
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    (easting, northing)
}

/// Inverse transverse Mercator: UTM easting/northing in metres to WGS84
/// (longitude, latitude) in degrees. Snyder eqs. 8-17 through 8-25.
fn utm_to_wgs84(easting: f64, northing: f64, zone: u8, north: bool) -> (f64, f64) {
    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * E2 * E2 / 64.0 - 5.0 * E2 * E2 * E2 / 256.0));

    let e1 = (1.0 - (1.0 - E2).sqrt()) / (1.0 + (1.0 - E2).sqrt());
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    // Footprint latitude (Snyder eq. 3-26)
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = A / (1.0 - E2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = A * (1.0 - E2) / (1.0 - E2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi1;

    (lon.to_degrees(), lat.to_degrees())
}

/// Central meridian of a UTM zone, in radians.
fn central_meridian(zone: u8) -> f64 {
    ((f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Meridional arc from equator to latitude `lat` (radians). Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

#[cfg(test)]
mod tests {
    use geo::{Contains, LineString, Point, Polygon};

    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(
            diff < tol,
            "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}"
        );
    }

    #[test]
    fn epsg_round_trip() {
        for epsg in [4326, 32601, 32632, 32660, 32701, 32721, 32760] {
            let crs = Crs::from_epsg(epsg).unwrap();
            assert_eq!(crs.epsg(), epsg);
        }
        assert_eq!(Crs::from_epsg(3857), None);
        assert_eq!(Crs::from_epsg(32600), None); // zone 0 invalid
        assert_eq!(Crs::from_epsg(32661), None); // zone 61 invalid
    }

    #[test]
    fn estimate_utm_zones() {
        // Tauberbischofsheim, Germany sits in zone 32 north
        assert_eq!(
            estimate_utm(9.66, 49.62),
            Crs::Utm {
                zone: 32,
                north: true
            }
        );
        assert_eq!(estimate_utm(9.66, 49.62).epsg(), 32632);
        // Buenos Aires: zone 21 south
        assert_eq!(estimate_utm(-58.38, -34.60).epsg(), 32721);
        // Antimeridian edges clamp to valid zones
        assert_eq!(estimate_utm(-180.0, 10.0).epsg(), 32601);
        assert_eq!(estimate_utm(180.0, 10.0).epsg(), 32660);
    }

    // Reference values from pyproj (PROJ 9.x):
    //   from pyproj import Transformer
    //   t = Transformer.from_crs(4326, 32630, always_xy=True)
    //   t.transform(-3.7037, 40.4168) → (440298.94, 4474257.31)
    #[test]
    fn madrid_wgs84_to_utm30n() {
        let (e, n) = wgs84_to_utm(-3.7037, 40.4168, 30, true);
        assert_close(e, 440_298.94, 1.0, "easting");
        assert_close(n, 4_474_257.31, 1.0, "northing");
    }

    // Buenos Aires: (-58.3816, -34.6037) → UTM 21S (EPSG:32721)
    //   t.transform(-58.3816, -34.6037) → (373317.50, 6170036.17)
    #[test]
    fn buenos_aires_wgs84_to_utm21s() {
        let (e, n) = wgs84_to_utm(-58.3816, -34.6037, 21, false);
        assert_close(e, 373_317.50, 1.0, "easting");
        assert_close(n, 6_170_036.17, 1.0, "northing");
    }

    #[test]
    fn equator_central_meridian() {
        let (e, n) = wgs84_to_utm(-3.0, 0.0, 30, true);
        assert_close(e, 500_000.0, 0.01, "easting at CM");
        assert_close(n, 0.0, 0.01, "northing at equator");
    }

    #[test]
    fn inverse_round_trip() {
        for &(lon, lat, zone, north) in &[
            (-3.7037, 40.4168, 30, true),
            (9.6624, 49.6225, 32, true),
            (-58.3816, -34.6037, 21, false),
        ] {
            let (e, n) = wgs84_to_utm(lon, lat, zone, north);
            let (lon2, lat2) = utm_to_wgs84(e, n, zone, north);
            assert_close(lon2, lon, 1e-8, "longitude");
            assert_close(lat2, lat, 1e-8, "latitude");
        }
    }

    #[test]
    fn identity_transform_is_noop() {
        let c = Coord { x: 9.66, y: 49.62 };
        let out = transform_coord(c, Crs::Wgs84, Crs::Wgs84);
        assert!((out.x - c.x).abs() < f64::EPSILON);
        assert!((out.y - c.y).abs() < f64::EPSILON);
    }

    #[test]
    fn polygon_round_trip_preserves_containment() {
        // A point inside the original polygon stays inside after projecting
        // to the metric frame and back.
        let poly = Polygon::new(
            LineString::from(vec![
                (9.65, 49.61),
                (9.68, 49.61),
                (9.68, 49.64),
                (9.65, 49.64),
                (9.65, 49.61),
            ]),
            vec![],
        );
        let inner = Point::new(9.665, 49.625);
        assert!(poly.contains(&inner));

        let utm = estimate_utm(9.665, 49.625);
        let projected = project(&poly, Crs::Wgs84, utm);
        let projected_point = project(&inner, Crs::Wgs84, utm);
        assert!(projected.contains(&projected_point));

        let back = project(&projected, utm, Crs::Wgs84);
        assert!(back.contains(&inner));
    }

    #[test]
    fn frame_mismatch_is_an_error() {
        assert!(require_same_frame(Crs::Wgs84, Crs::Wgs84).is_ok());
        let err = require_same_frame(
            Crs::Wgs84,
            Crs::Utm {
                zone: 32,
                north: true,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("EPSG:32632"));
    }
}
