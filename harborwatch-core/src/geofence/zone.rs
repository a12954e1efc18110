//! Zone Definitions
//!
//! Defines zone geometry, the event flags a zone reports and the zone
//! record kept by the evaluator.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, Position};

/// Zone identifier, assigned by the evaluator
pub type ZoneId = u32;

/// Zone geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ZoneGeometry {
    /// Circle around a center point
    #[serde(rename_all = "camelCase")]
    Circle {
        center: Position,
        /// Radius in nautical miles
        radius: f64,
    },
    /// Latitude/longitude aligned rectangle
    Rectangle { bounds: BoundingBox },
    /// Closed polygon, vertices in order (closing edge implied)
    Polygon { vertices: Vec<Position> },
}

bitflags! {
    /// Which transitions a zone reports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ZoneEventFlags: u8 {
        const ENTER = 0b0001;
        const EXIT = 0b0010;
        const DWELL = 0b0100;
    }
}

impl Default for ZoneEventFlags {
    fn default() -> Self {
        ZoneEventFlags::ENTER | ZoneEventFlags::EXIT
    }
}

/// Zone as supplied by the user, before an id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub geometry: ZoneGeometry,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub events: ZoneEventFlags,
    /// Minimum stay before a dwell event, required for dwell reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dwell_time_minutes: Option<f64>,
}

fn default_enabled() -> bool {
    true
}

impl ZoneDefinition {
    pub fn new(name: impl Into<String>, geometry: ZoneGeometry) -> Self {
        ZoneDefinition {
            name: name.into(),
            description: None,
            geometry,
            enabled: true,
            events: ZoneEventFlags::default(),
            dwell_time_minutes: None,
        }
    }

    /// Enable dwell reporting after `minutes` inside the zone
    pub fn with_dwell(mut self, minutes: f64) -> Self {
        self.events |= ZoneEventFlags::DWELL;
        self.dwell_time_minutes = Some(minutes);
        self
    }

    pub fn with_events(mut self, events: ZoneEventFlags) -> Self {
        self.events = events;
        self
    }
}

/// Zone held by the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub geometry: ZoneGeometry,
    pub enabled: bool,
    pub events: ZoneEventFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwell_time_minutes: Option<f64>,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
}

impl Zone {
    pub fn from_definition(id: ZoneId, definition: ZoneDefinition, created_at: u64) -> Self {
        Zone {
            id,
            name: definition.name,
            description: definition.description,
            geometry: definition.geometry,
            enabled: definition.enabled,
            events: definition.events,
            dwell_time_minutes: definition.dwell_time_minutes,
            created_at,
        }
    }

    /// Replace the user-editable fields, keeping id and creation time
    pub(crate) fn apply(&mut self, definition: ZoneDefinition) {
        self.name = definition.name;
        self.description = definition.description;
        self.geometry = definition.geometry;
        self.enabled = definition.enabled;
        self.events = definition.events;
        self.dwell_time_minutes = definition.dwell_time_minutes;
    }

    /// Dwell threshold in milliseconds, if dwell reporting is active
    pub fn dwell_threshold_ms(&self) -> Option<u64> {
        if !self.events.contains(ZoneEventFlags::DWELL) {
            return None;
        }
        self.dwell_time_minutes
            .filter(|m| *m > 0.0)
            .map(|m| (m * 60_000.0) as u64)
    }
}
