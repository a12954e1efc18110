//! Geofencing
//!
//! User-defined circle, rectangle and polygon zones, point-in-zone tests,
//! derived zone geometry and enter/exit/dwell event derivation.
//!
//! # Example
//!
//! ```rust,ignore
//! use harborwatch_core::geofence::{GeofenceEvaluator, ZoneDefinition, ZoneGeometry};
//! use harborwatch_core::geo::Position;
//!
//! let mut geofence = GeofenceEvaluator::default();
//! let zone_id = geofence.add_zone(
//!     ZoneDefinition::new(
//!         "Busan North Port",
//!         ZoneGeometry::Circle { center: Position::new(35.1, 129.04), radius: 2.0 },
//!     )
//!     .with_dwell(30.0),
//!     now,
//! )?;
//!
//! // On every vessel batch
//! for event in geofence.evaluate(&vessels, now) {
//!     println!("{} {:?} {}", event.vessel_id, event.event_type, event.zone_name);
//! }
//! ```

mod evaluator;
mod shape;
mod validate;
mod zone;

pub use evaluator::{
    GeofenceError, GeofenceEvaluator, GeofenceStats, VesselZoneStatus, ZoneEvent, ZoneEventType,
    DEFAULT_EVENT_LOG_CAPACITY,
};
pub use shape::is_inside;
pub use validate::{validate_zone, ZoneValidationError, MAX_CIRCLE_RADIUS_NM, MIN_POLYGON_VERTICES};
pub use zone::{Zone, ZoneDefinition, ZoneEventFlags, ZoneGeometry, ZoneId};
