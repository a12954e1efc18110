//! Zone validation
//!
//! Advisory checks for zone creation. The geometric tests never depend on
//! these having passed.

use thiserror::Error;

use super::zone::{ZoneDefinition, ZoneGeometry};

/// Largest circle radius accepted, in nautical miles
pub const MAX_CIRCLE_RADIUS_NM: f64 = 1000.0;

/// Minimum number of polygon vertices
pub const MIN_POLYGON_VERTICES: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneValidationError {
    #[error("Zone name is required")]
    EmptyName,
    #[error("Radius must be greater than 0 (got {0} NM)")]
    NonPositiveRadius(f64),
    #[error("Radius must be at most 1000 NM (got {0} NM)")]
    RadiusTooLarge(f64),
    #[error("North bound must be greater than south bound")]
    InvertedLatitude,
    #[error("East bound must be greater than west bound")]
    InvertedLongitude,
    #[error("Polygon needs at least 3 points (got {0})")]
    TooFewVertices(usize),
    #[error("Dwell time must be greater than 0 minutes")]
    NonPositiveDwell,
}

/// Validate a zone definition, collecting every problem found
pub fn validate_zone(zone: &ZoneDefinition) -> Result<(), Vec<ZoneValidationError>> {
    let mut errors = Vec::new();

    if zone.name.trim().is_empty() {
        errors.push(ZoneValidationError::EmptyName);
    }

    match &zone.geometry {
        ZoneGeometry::Circle { radius, .. } => {
            if *radius <= 0.0 {
                errors.push(ZoneValidationError::NonPositiveRadius(*radius));
            }
            if *radius > MAX_CIRCLE_RADIUS_NM {
                errors.push(ZoneValidationError::RadiusTooLarge(*radius));
            }
        }
        ZoneGeometry::Rectangle { bounds } => {
            if bounds.north <= bounds.south {
                errors.push(ZoneValidationError::InvertedLatitude);
            }
            if bounds.east <= bounds.west {
                errors.push(ZoneValidationError::InvertedLongitude);
            }
        }
        ZoneGeometry::Polygon { vertices } => {
            if vertices.len() < MIN_POLYGON_VERTICES {
                errors.push(ZoneValidationError::TooFewVertices(vertices.len()));
            }
        }
    }

    if matches!(zone.dwell_time_minutes, Some(m) if m <= 0.0) {
        errors.push(ZoneValidationError::NonPositiveDwell);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{BoundingBox, Position};

    #[test]
    fn test_valid_circle() {
        let zone = ZoneDefinition::new(
            "Harbor",
            ZoneGeometry::Circle {
                center: Position::new(35.1, 129.0),
                radius: 1.5,
            },
        );
        assert!(validate_zone(&zone).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let zone = ZoneDefinition::new(
            "  ",
            ZoneGeometry::Rectangle {
                bounds: BoundingBox {
                    north: 1.0,
                    south: 2.0,
                    east: 1.0,
                    west: 1.0,
                },
            },
        );
        let errors = validate_zone(&zone).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ZoneValidationError::EmptyName,
                ZoneValidationError::InvertedLatitude,
                ZoneValidationError::InvertedLongitude,
            ]
        );
    }

    #[test]
    fn test_radius_bounds() {
        let circle = |radius| {
            ZoneDefinition::new(
                "c",
                ZoneGeometry::Circle {
                    center: Position::default(),
                    radius,
                },
            )
        };
        assert_eq!(
            validate_zone(&circle(0.0)).unwrap_err(),
            vec![ZoneValidationError::NonPositiveRadius(0.0)]
        );
        assert_eq!(
            validate_zone(&circle(1500.0)).unwrap_err(),
            vec![ZoneValidationError::RadiusTooLarge(1500.0)]
        );
    }

    #[test]
    fn test_polygon_and_dwell() {
        let mut zone = ZoneDefinition::new(
            "p",
            ZoneGeometry::Polygon {
                vertices: vec![Position::default(), Position::new(1.0, 1.0)],
            },
        );
        zone.dwell_time_minutes = Some(0.0);
        let errors = validate_zone(&zone).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].to_string(),
            "Polygon needs at least 3 points (got 2)"
        );
        assert_eq!(errors[1], ZoneValidationError::NonPositiveDwell);
    }
}
