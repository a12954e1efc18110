//! Point-in-zone tests and derived zone geometry
//!
//! All operations are total: malformed geometry (polygon with fewer than
//! three vertices, empty vertex list) yields "outside" / zero area / a zero
//! centroid instead of failing.

use std::f64::consts::PI;

use super::zone::{Zone, ZoneGeometry};
use crate::geo::{distance_nm, BoundingBox, Position};

/// Square degrees to square nautical miles (60 NM per degree, squared).
/// Only accurate near the equator.
const SQ_DEGREE_TO_SQ_NM: f64 = 3600.0;

impl ZoneGeometry {
    /// Check if a point lies inside this geometry
    pub fn contains(&self, point: &Position) -> bool {
        match self {
            ZoneGeometry::Circle { center, radius } => distance_nm(point, center) <= *radius,
            ZoneGeometry::Rectangle { bounds } => bounds.contains(point),
            ZoneGeometry::Polygon { vertices } => polygon_contains(vertices, point),
        }
    }

    /// Center point: circle center, rectangle midpoint or polygon vertex average
    pub fn centroid(&self) -> Position {
        match self {
            ZoneGeometry::Circle { center, .. } => *center,
            ZoneGeometry::Rectangle { bounds } => bounds.center(),
            ZoneGeometry::Polygon { vertices } => {
                if vertices.is_empty() {
                    return Position::default();
                }
                let n = vertices.len() as f64;
                let (lat, lon) = vertices.iter().fold((0.0, 0.0), |(lat, lon), v| {
                    (lat + v.latitude, lon + v.longitude)
                });
                Position::new(lat / n, lon / n)
            }
        }
    }

    /// Bounding box of the geometry
    pub fn bounds(&self) -> BoundingBox {
        match self {
            ZoneGeometry::Circle { center, radius } => {
                // 1 degree of latitude ≈ 60 NM
                let lat_offset = radius / 60.0;
                let lon_offset = radius / (60.0 * center.latitude.to_radians().cos());
                BoundingBox {
                    north: center.latitude + lat_offset,
                    south: center.latitude - lat_offset,
                    east: center.longitude + lon_offset,
                    west: center.longitude - lon_offset,
                }
            }
            ZoneGeometry::Rectangle { bounds } => *bounds,
            ZoneGeometry::Polygon { vertices } => {
                if vertices.is_empty() {
                    return BoundingBox {
                        north: 0.0,
                        south: 0.0,
                        east: 0.0,
                        west: 0.0,
                    };
                }
                vertices.iter().fold(
                    BoundingBox {
                        north: -90.0,
                        south: 90.0,
                        east: -180.0,
                        west: 180.0,
                    },
                    |b, v| BoundingBox {
                        north: b.north.max(v.latitude),
                        south: b.south.min(v.latitude),
                        east: b.east.max(v.longitude),
                        west: b.west.min(v.longitude),
                    },
                )
            }
        }
    }

    /// Approximate area in square nautical miles
    pub fn area_sq_nm(&self) -> f64 {
        match self {
            ZoneGeometry::Circle { radius, .. } => PI * radius * radius,
            ZoneGeometry::Rectangle { bounds } => {
                let south_west = Position::new(bounds.south, bounds.west);
                let width = distance_nm(&south_west, &Position::new(bounds.south, bounds.east));
                let height = distance_nm(&south_west, &Position::new(bounds.north, bounds.west));
                width * height
            }
            ZoneGeometry::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return 0.0;
                }
                // Planar shoelace in degree space
                let twice_area: f64 = vertices
                    .iter()
                    .zip(vertices.iter().cycle().skip(1))
                    .map(|(a, b)| a.longitude * b.latitude - b.longitude * a.latitude)
                    .sum();
                (twice_area / 2.0).abs() * SQ_DEGREE_TO_SQ_NM
            }
        }
    }
}

/// Even-odd ray casting; longitude is x, latitude is y
fn polygon_contains(vertices: &[Position], point: &Position) -> bool {
    if vertices.len() < 3 {
        // Hit per vessel per tick; validate_zone rejects these up front
        log::trace!("Polygon with {} vertices treated as empty", vertices.len());
        return false;
    }

    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for (i, vi) in vertices.iter().enumerate() {
        let vj = &vertices[j];
        let (xi, yi) = (vi.longitude, vi.latitude);
        let (xj, yj) = (vj.longitude, vj.latitude);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Check if a point is inside a zone. Disabled zones contain nothing.
pub fn is_inside(point: &Position, zone: &Zone) -> bool {
    zone.enabled && zone.geometry.contains(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::ZoneDefinition;

    fn unit_square() -> ZoneGeometry {
        ZoneGeometry::Polygon {
            vertices: vec![
                Position::new(0.0, 0.0),
                Position::new(0.0, 1.0),
                Position::new(1.0, 1.0),
                Position::new(1.0, 0.0),
            ],
        }
    }

    #[test]
    fn test_polygon_contains() {
        let square = unit_square();
        assert!(square.contains(&Position::new(0.5, 0.5)));
        assert!(!square.contains(&Position::new(2.0, 2.0)));
        assert!(!square.contains(&Position::new(-0.5, 0.5)));
    }

    #[test]
    fn test_concave_polygon() {
        // "U" shape open to the north
        let u = ZoneGeometry::Polygon {
            vertices: vec![
                Position::new(0.0, 0.0),
                Position::new(0.0, 3.0),
                Position::new(3.0, 3.0),
                Position::new(3.0, 2.0),
                Position::new(1.0, 2.0),
                Position::new(1.0, 1.0),
                Position::new(3.0, 1.0),
                Position::new(3.0, 0.0),
            ],
        };
        assert!(u.contains(&Position::new(2.0, 0.5)));
        assert!(u.contains(&Position::new(2.0, 2.5)));
        assert!(!u.contains(&Position::new(2.0, 1.5)));
    }

    #[test]
    fn test_degenerate_polygon_is_outside() {
        let line = ZoneGeometry::Polygon {
            vertices: vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0)],
        };
        assert!(!line.contains(&Position::new(0.5, 0.5)));
        assert_eq!(line.area_sq_nm(), 0.0);
    }

    #[test]
    fn test_circle_boundary() {
        let center = Position::new(35.0, 129.0);
        let circle = ZoneGeometry::Circle {
            center,
            radius: 1.0,
        };
        // Due north; 1 NM = 1/60.04 degrees of latitude on the mean sphere
        let nm_in_degrees = 1.0 / (crate::geo::EARTH_RADIUS_NM * PI / 180.0);
        assert!(circle.contains(&center));
        assert!(circle.contains(&Position::new(35.0 + 0.99 * nm_in_degrees, 129.0)));
        for eps in [1e-3, 1e-2, 0.1, 1.0] {
            let outside = Position::new(35.0 + (1.0 + eps) * nm_in_degrees, 129.0);
            assert!(!circle.contains(&outside), "eps {}", eps);
        }
    }

    #[test]
    fn test_rectangle_contains() {
        let rect = ZoneGeometry::Rectangle {
            bounds: BoundingBox {
                north: 35.2,
                south: 35.0,
                east: 129.2,
                west: 129.0,
            },
        };
        assert!(rect.contains(&Position::new(35.1, 129.1)));
        assert!(rect.contains(&Position::new(35.2, 129.0)));
        assert!(!rect.contains(&Position::new(35.3, 129.1)));
        assert!(!rect.contains(&Position::new(35.1, 128.9)));
    }

    #[test]
    fn test_disabled_zone_is_outside() {
        let mut def = ZoneDefinition::new("square", unit_square());
        def.enabled = false;
        let zone = Zone::from_definition(1, def, 0);
        assert!(!is_inside(&Position::new(0.5, 0.5), &zone));
    }

    #[test]
    fn test_centroids() {
        assert_eq!(unit_square().centroid(), Position::new(0.5, 0.5));
        let rect = ZoneGeometry::Rectangle {
            bounds: BoundingBox {
                north: 2.0,
                south: 0.0,
                east: 4.0,
                west: 2.0,
            },
        };
        assert_eq!(rect.centroid(), Position::new(1.0, 3.0));
        let empty = ZoneGeometry::Polygon { vertices: vec![] };
        assert_eq!(empty.centroid(), Position::default());
    }

    #[test]
    fn test_bounds() {
        let b = unit_square().bounds();
        assert_eq!((b.north, b.south, b.east, b.west), (1.0, 0.0, 1.0, 0.0));

        let circle = ZoneGeometry::Circle {
            center: Position::new(0.0, 0.0),
            radius: 6.0,
        };
        let b = circle.bounds();
        assert!((b.north - 0.1).abs() < 1e-12);
        assert!((b.west + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_areas() {
        let circle = ZoneGeometry::Circle {
            center: Position::new(0.0, 0.0),
            radius: 2.0,
        };
        assert!((circle.area_sq_nm() - 4.0 * PI).abs() < 1e-9);

        // One square degree at the equator ≈ 3600 NM²
        assert!((unit_square().area_sq_nm() - 3600.0).abs() < 1e-9);

        let rect = ZoneGeometry::Rectangle {
            bounds: BoundingBox {
                north: 1.0,
                south: 0.0,
                east: 1.0,
                west: 0.0,
            },
        };
        let area = rect.area_sq_nm();
        assert!((area - 60.04 * 60.04).abs() < 10.0, "area {}", area);
    }
}
