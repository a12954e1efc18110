//! Geodesic Primitives
//!
//! Great-circle distance and initial bearing on a spherical Earth
//! (mean radius, no geoid correction). Every other module builds on these.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Mean Earth radius in nautical miles
pub const EARTH_RADIUS_NM: f64 = 3_440.065;
/// Conversion constants
pub const NAUTICAL_MILE: f64 = 1852.0;
pub const KN_TO_MS: f64 = NAUTICAL_MILE / 3600.0;
pub const MS_TO_KN: f64 = 3600.0 / NAUTICAL_MILE;
/// Flat-earth scale factors used for short-range relative motion
pub const METERS_PER_DEGREE_LATITUDE: f64 = 110_540.0;
pub const METERS_PER_DEGREE_LONGITUDE_EQUATOR: f64 = 111_320.0;

/// Geographic position in degrees (WGS84 approximation)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in nautical miles
    pub fn distance_nm(&self, other: &Position) -> f64 {
        distance_nm(self, other)
    }

    /// Initial bearing towards `other` in degrees
    pub fn bearing_to(&self, other: &Position) -> f64 {
        bearing_degrees(self, other)
    }
}

/// Axis-aligned latitude/longitude bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Check containment, edges inclusive. No antimeridian wraparound.
    pub fn contains(&self, p: &Position) -> bool {
        p.latitude >= self.south
            && p.latitude <= self.north
            && p.longitude >= self.west
            && p.longitude <= self.east
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }
}

/// Central angle between two positions (Haversine), in radians
fn central_angle(a: &Position, b: &Position) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in meters
pub fn distance_meters(a: &Position, b: &Position) -> f64 {
    EARTH_RADIUS_M * central_angle(a, b)
}

/// Great-circle distance in nautical miles
pub fn distance_nm(a: &Position, b: &Position) -> f64 {
    EARTH_RADIUS_NM * central_angle(a, b)
}

/// Initial bearing from `a` to `b`, normalized to [0, 360)
pub fn bearing_degrees(a: &Position, b: &Position) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Normalize an angle to [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Calculate meters per degree longitude at a given latitude
#[inline]
pub fn meters_per_degree_longitude(lat_deg: f64) -> f64 {
    METERS_PER_DEGREE_LONGITUDE_EQUATOR * lat_deg.to_radians().cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = Position::new(35.1, 129.04);
        assert_eq!(distance_nm(&p, &p), 0.0);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_symmetry() {
        let a = Position::new(35.0, 129.0);
        let b = Position::new(34.5, 128.2);
        assert!((distance_nm(&a, &b) - distance_nm(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_latitude_is_sixty_nm() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(1.0, 0.0);
        let d = distance_nm(&a, &b);
        assert!((d - 60.04).abs() < 0.05, "got {}", d);
        // Meters and NM agree through the NM constant
        assert!((distance_meters(&a, &b) / NAUTICAL_MILE - d).abs() < 0.01);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Position::new(0.0, 0.0);
        assert!((bearing_degrees(&origin, &Position::new(1.0, 0.0)) - 0.0).abs() < 1e-6);
        assert!((bearing_degrees(&origin, &Position::new(0.0, 1.0)) - 90.0).abs() < 1e-6);
        assert!((bearing_degrees(&origin, &Position::new(-1.0, 0.0)) - 180.0).abs() < 1e-6);
        assert!((bearing_degrees(&origin, &Position::new(0.0, -1.0)) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox {
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
        };
        assert!(bbox.contains(&Position::new(0.5, 0.5)));
        assert!(bbox.contains(&Position::new(1.0, 0.0)));
        assert!(!bbox.contains(&Position::new(1.1, 0.5)));
        assert_eq!(bbox.center(), Position::new(0.5, 0.5));
    }
}
