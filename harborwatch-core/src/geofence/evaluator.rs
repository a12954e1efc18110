//! Geofence evaluator
//!
//! Owns the zone list, the per (vessel, zone) membership state and the
//! recent event log. Each call to [`GeofenceEvaluator::evaluate`] compares
//! the new vessel positions with the previous membership only, so events are
//! edge-triggered:
//!
//! | previous | now     | emitted (if flag set)             |
//! |----------|---------|-----------------------------------|
//! | outside  | inside  | `enter`                           |
//! | inside   | outside | `exit`                            |
//! | inside   | inside  | `dwell`, once per stay, after the |
//! |          |         | configured dwell time             |

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

use super::shape::is_inside;
use super::validate::{validate_zone, ZoneValidationError};
use super::zone::{Zone, ZoneDefinition, ZoneEventFlags, ZoneId};
use crate::geo::Position;
use crate::vessel::{VesselId, VesselState};

/// Default number of recent zone events retained
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    #[error("Zone {0} not found")]
    ZoneNotFound(ZoneId),
    #[error("Invalid zone: {}", format_errors(.0))]
    Invalid(Vec<ZoneValidationError>),
}

fn format_errors(errors: &[ZoneValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneEventType {
    Enter,
    Exit,
    Dwell,
}

impl ZoneEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneEventType::Enter => "enter",
            ZoneEventType::Exit => "exit",
            ZoneEventType::Dwell => "dwell",
        }
    }
}

/// Zone event, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEvent {
    pub id: u64,
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub vessel_id: VesselId,
    pub vessel_name: String,
    pub event_type: ZoneEventType,
    /// Milliseconds since epoch
    pub timestamp: u64,
    pub position: Position,
}

/// Membership of one vessel in one zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselZoneStatus {
    pub inside: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_enter: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_exit: Option<u64>,
    /// Dwell already reported for the current stay
    pub dwell_reported: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceStats {
    pub total_zones: usize,
    pub active_zones: usize,
    pub total_events: usize,
    pub vessels_tracked: usize,
}

#[derive(Debug, Clone)]
pub struct GeofenceEvaluator {
    zones: BTreeMap<ZoneId, Zone>,
    status: BTreeMap<(VesselId, ZoneId), VesselZoneStatus>,
    /// Most recent first
    events: VecDeque<ZoneEvent>,
    event_capacity: usize,
    next_zone_id: ZoneId,
    next_event_id: u64,
}

impl GeofenceEvaluator {
    pub fn new(event_capacity: usize) -> Self {
        GeofenceEvaluator {
            zones: BTreeMap::new(),
            status: BTreeMap::new(),
            events: VecDeque::new(),
            event_capacity,
            next_zone_id: 1,
            next_event_id: 1,
        }
    }

    // -------------------------------------------------------------------------
    // Zone management
    // -------------------------------------------------------------------------

    /// Validate and add a zone, returning its assigned id
    pub fn add_zone(&mut self, definition: ZoneDefinition, now: u64) -> Result<ZoneId, GeofenceError> {
        validate_zone(&definition).map_err(GeofenceError::Invalid)?;

        let id = self.next_zone_id;
        self.next_zone_id += 1;
        log::debug!("Adding zone {} '{}'", id, definition.name);
        self.zones.insert(id, Zone::from_definition(id, definition, now));
        Ok(id)
    }

    /// Replace a zone's definition. Membership is kept; the next evaluation
    /// reports any transition the new geometry causes.
    pub fn update_zone(&mut self, id: ZoneId, definition: ZoneDefinition) -> Result<(), GeofenceError> {
        validate_zone(&definition).map_err(GeofenceError::Invalid)?;
        let zone = self.zones.get_mut(&id).ok_or(GeofenceError::ZoneNotFound(id))?;
        zone.apply(definition);
        if !zone.enabled {
            self.forget_zone(id);
        }
        Ok(())
    }

    pub fn remove_zone(&mut self, id: ZoneId) -> Result<Zone, GeofenceError> {
        let zone = self.zones.remove(&id).ok_or(GeofenceError::ZoneNotFound(id))?;
        self.forget_zone(id);
        Ok(zone)
    }

    /// Enable/disable a zone. Disabling resets its membership state.
    pub fn set_zone_enabled(&mut self, id: ZoneId, enabled: bool) -> Result<(), GeofenceError> {
        let zone = self.zones.get_mut(&id).ok_or(GeofenceError::ZoneNotFound(id))?;
        zone.enabled = enabled;
        if !enabled {
            self.forget_zone(id);
        }
        Ok(())
    }

    /// Flip a zone's enabled flag, returning the new value
    pub fn toggle_zone(&mut self, id: ZoneId) -> Result<bool, GeofenceError> {
        let enabled = !self.zone(id).ok_or(GeofenceError::ZoneNotFound(id))?.enabled;
        self.set_zone_enabled(id, enabled)?;
        Ok(enabled)
    }

    pub fn clear_zones(&mut self) {
        self.zones.clear();
        self.status.clear();
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    fn forget_zone(&mut self, id: ZoneId) {
        self.status.retain(|&(_, zone_id), _| zone_id != id);
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    /// Evaluate a vessel snapshot against every enabled zone
    ///
    /// Returns the events emitted by this evaluation, in vessel then zone
    /// order. They are also added to the recent event log.
    pub fn evaluate(&mut self, vessels: &[VesselState], now: u64) -> Vec<ZoneEvent> {
        let mut emitted = Vec::new();
        if self.zones.is_empty() {
            return emitted;
        }

        for vessel in vessels {
            for zone in self.zones.values().filter(|z| z.enabled) {
                let inside = is_inside(&vessel.position, zone);
                let status = self.status.entry((vessel.id, zone.id)).or_default();

                let event_type = match (status.inside, inside) {
                    (false, true) => {
                        status.inside = true;
                        status.last_enter = Some(now);
                        status.dwell_reported = false;
                        zone.events
                            .contains(ZoneEventFlags::ENTER)
                            .then_some(ZoneEventType::Enter)
                    }
                    (true, false) => {
                        status.inside = false;
                        status.last_exit = Some(now);
                        status.dwell_reported = false;
                        zone.events
                            .contains(ZoneEventFlags::EXIT)
                            .then_some(ZoneEventType::Exit)
                    }
                    (true, true) => {
                        let dwelled = match (zone.dwell_threshold_ms(), status.last_enter) {
                            (Some(threshold), Some(entered)) => {
                                !status.dwell_reported && now.saturating_sub(entered) >= threshold
                            }
                            _ => false,
                        };
                        if dwelled {
                            status.dwell_reported = true;
                        }
                        dwelled.then_some(ZoneEventType::Dwell)
                    }
                    (false, false) => None,
                };

                if let Some(event_type) = event_type {
                    let event = ZoneEvent {
                        id: self.next_event_id,
                        zone_id: zone.id,
                        zone_name: zone.name.clone(),
                        vessel_id: vessel.id,
                        vessel_name: vessel.name.clone(),
                        event_type,
                        timestamp: now,
                        position: vessel.position,
                    };
                    self.next_event_id += 1;
                    log::debug!(
                        "Zone event: {} {} '{}'",
                        vessel.id,
                        event_type.as_str(),
                        zone.name
                    );
                    emitted.push(event);
                }
            }
        }

        for event in &emitted {
            self.events.push_front(event.clone());
        }
        self.events.truncate(self.event_capacity);
        emitted
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn status(&self, vessel_id: VesselId, zone_id: ZoneId) -> Option<&VesselZoneStatus> {
        self.status.get(&(vessel_id, zone_id))
    }

    /// Zones a vessel is currently inside
    pub fn vessel_zones(&self, vessel_id: VesselId) -> Vec<&Zone> {
        self.status
            .range((vessel_id, ZoneId::MIN)..=(vessel_id, ZoneId::MAX))
            .filter(|(_, status)| status.inside)
            .filter_map(|(&(_, zone_id), _)| self.zones.get(&zone_id))
            .collect()
    }

    /// Vessels currently inside a zone
    pub fn vessels_in_zone(&self, zone_id: ZoneId) -> Vec<VesselId> {
        self.status
            .iter()
            .filter(|(key, status)| key.1 == zone_id && status.inside)
            .map(|(key, _)| key.0)
            .collect()
    }

    /// Recent events, most recent first
    pub fn events(&self) -> impl Iterator<Item = &ZoneEvent> {
        self.events.iter()
    }

    pub fn delete_event(&mut self, event_id: u64) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != event_id);
        self.events.len() != before
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Drop membership state for vessels no longer reported
    pub fn forget_vessels(&mut self, vessel_ids: &[VesselId]) {
        self.status.retain(|(vessel_id, _), _| !vessel_ids.contains(vessel_id));
    }

    pub fn stats(&self) -> GeofenceStats {
        let mut vessels: Vec<VesselId> = self.status.keys().map(|&(v, _)| v).collect();
        vessels.dedup();
        GeofenceStats {
            total_zones: self.zones.len(),
            active_zones: self.zones.values().filter(|z| z.enabled).count(),
            total_events: self.events.len(),
            vessels_tracked: vessels.len(),
        }
    }
}

impl Default for GeofenceEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}
