//! Vessel State and Store
//!
//! `VesselState` is the read-only snapshot every algorithm consumes.
//! `VesselStore` merges partial feed updates into those snapshots, caps the
//! number of vessels held and hands out cheap shared snapshots: updates clone
//! the map only while an older snapshot is still alive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::geo::Position;

/// Vessel identifier (MMSI)
pub type VesselId = u32;

pub const UNKNOWN: &str = "Unknown";

/// Default maximum number of vessels kept in a store
pub const DEFAULT_STORE_CAPACITY: usize = 1000;

/// Complete vessel state as seen by the algorithms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselState {
    pub id: VesselId,
    pub name: String,
    #[serde(rename = "type")]
    pub vessel_type: String,
    pub position: Position,
    /// False until a position report has been seen; `position` is (0, 0) then
    pub has_position: bool,
    /// Course over ground in degrees [0, 360)
    pub course: f64,
    /// Speed over ground in knots
    pub speed: f64,
    pub destination: String,
    /// Timestamp of last update (milliseconds since epoch)
    pub last_update: u64,
}

impl VesselState {
    pub fn new(id: VesselId, position: Position, course: f64, speed: f64, last_update: u64) -> Self {
        VesselState {
            id,
            name: UNKNOWN.to_string(),
            vessel_type: UNKNOWN.to_string(),
            position,
            has_position: true,
            course,
            speed,
            destination: UNKNOWN.to_string(),
            last_update,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, vessel_type: impl Into<String>) -> Self {
        self.vessel_type = vessel_type.into();
        self
    }
}

/// Partial vessel update, as produced by the feed parser.
///
/// Absent fields keep whatever the store already knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselUpdate {
    pub id: VesselId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub vessel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub timestamp: u64,
}

impl VesselUpdate {
    pub fn new(id: VesselId, timestamp: u64) -> Self {
        VesselUpdate {
            id,
            timestamp,
            ..Default::default()
        }
    }

    /// Merge into the previous state (if any), producing the new state
    fn merge(self, existing: Option<&VesselState>) -> VesselState {
        fn pick(new: Option<String>, old: Option<&String>) -> String {
            new.filter(|s| !s.trim().is_empty())
                .or_else(|| old.cloned())
                .unwrap_or_else(|| UNKNOWN.to_string())
        }

        let has_position = self.position.is_some() || existing.map_or(false, |v| v.has_position);

        VesselState {
            id: self.id,
            name: pick(self.name, existing.map(|v| &v.name)),
            vessel_type: pick(self.vessel_type, existing.map(|v| &v.vessel_type)),
            position: self
                .position
                .or_else(|| existing.map(|v| v.position))
                .unwrap_or_default(),
            has_position,
            course: self
                .course
                .or_else(|| existing.map(|v| v.course))
                .unwrap_or(0.0),
            speed: self
                .speed
                .or_else(|| existing.map(|v| v.speed))
                .unwrap_or(0.0),
            destination: pick(self.destination, existing.map(|v| &v.destination)),
            last_update: self.timestamp,
        }
    }
}

/// Shared, immutable view of all vessels at one instant
pub type VesselSnapshot = Arc<BTreeMap<VesselId, VesselState>>;

/// Capped vessel map keyed by id with oldest-update eviction
#[derive(Debug, Clone)]
pub struct VesselStore {
    vessels: VesselSnapshot,
    capacity: usize,
}

impl VesselStore {
    pub fn new(capacity: usize) -> Self {
        VesselStore {
            vessels: Arc::new(BTreeMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Apply a partial update and return the merged state
    pub fn update(&mut self, update: VesselUpdate) -> VesselState {
        let vessels = Arc::make_mut(&mut self.vessels);
        let id = update.id;
        let state = update.merge(vessels.get(&id));
        vessels.insert(state.id, state.clone());

        if vessels.len() > self.capacity {
            if let Some(oldest) = Self::find_oldest(vessels, id) {
                log::debug!("Vessel store full, evicting {}", oldest);
                vessels.remove(&oldest);
            }
        }
        state
    }

    /// Remove vessels not updated within `max_age_ms`.
    ///
    /// Returns the ids that were removed.
    pub fn cleanup(&mut self, now: u64, max_age_ms: u64) -> Vec<VesselId> {
        let stale: Vec<VesselId> = self
            .vessels
            .values()
            .filter(|v| now.saturating_sub(v.last_update) > max_age_ms)
            .map(|v| v.id)
            .collect();

        if !stale.is_empty() {
            let vessels = Arc::make_mut(&mut self.vessels);
            for id in &stale {
                vessels.remove(id);
            }
            log::debug!("Removed {} stale vessels", stale.len());
        }
        stale
    }

    pub fn get(&self, id: VesselId) -> Option<&VesselState> {
        self.vessels.get(&id)
    }

    /// Cheap shared snapshot; later updates do not affect it
    pub fn snapshot(&self) -> VesselSnapshot {
        Arc::clone(&self.vessels)
    }

    /// All vessels ordered by id
    pub fn vessels(&self) -> Vec<VesselState> {
        self.vessels.values().cloned().collect()
    }

    /// Vessels with a reported position, ordered by id
    pub fn positioned(&self) -> Vec<VesselState> {
        self.vessels
            .values()
            .filter(|v| v.has_position)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest vessel other than `keep`, the one just written
    fn find_oldest(vessels: &BTreeMap<VesselId, VesselState>, keep: VesselId) -> Option<VesselId> {
        vessels
            .values()
            .filter(|v| v.id != keep)
            .min_by_key(|v| v.last_update)
            .map(|v| v.id)
    }
}

impl Default for VesselStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_update(id: VesselId, lat: f64, lon: f64, ts: u64) -> VesselUpdate {
        VesselUpdate {
            position: Some(Position::new(lat, lon)),
            course: Some(90.0),
            speed: Some(12.0),
            ..VesselUpdate::new(id, ts)
        }
    }

    #[test]
    fn test_update_merges_partial_fields() {
        let mut store = VesselStore::new(10);
        store.update(position_update(1, 35.0, 129.0, 1000));

        let mut statics = VesselUpdate::new(1, 2000);
        statics.name = Some("HANJIN BUSAN".to_string());
        statics.vessel_type = Some("70".to_string());
        let merged = store.update(statics);

        assert_eq!(merged.name, "HANJIN BUSAN");
        assert_eq!(merged.vessel_type, "70");
        assert_eq!(merged.position, Position::new(35.0, 129.0));
        assert_eq!(merged.speed, 12.0);
        assert_eq!(merged.last_update, 2000);
        assert_eq!(merged.destination, UNKNOWN);
    }

    #[test]
    fn test_new_vessel_defaults() {
        let mut store = VesselStore::new(10);
        let state = store.update(VesselUpdate::new(7, 5));
        assert_eq!(state.name, UNKNOWN);
        assert_eq!(state.position, Position::default());
        assert!(!state.has_position);
        assert_eq!(state.course, 0.0);
    }

    #[test]
    fn test_static_data_keeps_position_flag() {
        let mut store = VesselStore::new(10);
        let mut statics = VesselUpdate::new(1, 100);
        statics.name = Some("ALPHA".to_string());
        assert!(!store.update(statics.clone()).has_position);
        assert!(store.positioned().is_empty());

        store.update(position_update(1, 35.0, 129.0, 200));
        statics.timestamp = 300;
        let merged = store.update(statics);
        assert!(merged.has_position);
        assert_eq!(merged.position, Position::new(35.0, 129.0));

        store.update(VesselUpdate::new(2, 300));
        let positioned: Vec<VesselId> = store.positioned().iter().map(|v| v.id).collect();
        assert_eq!(positioned, vec![1]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = VesselStore::new(2);
        store.update(position_update(1, 0.0, 0.0, 300));
        store.update(position_update(2, 0.0, 0.0, 100));
        store.update(position_update(3, 0.0, 0.0, 200));

        assert_eq!(store.len(), 2);
        assert!(store.get(2).is_none());
        assert!(store.get(1).is_some());
        assert!(store.get(3).is_some());
    }

    #[test]
    fn test_capacity_keeps_incoming_vessel() {
        // An out-of-order update older than everything stored still lands
        let mut store = VesselStore::new(2);
        store.update(position_update(1, 0.0, 0.0, 100));
        store.update(position_update(2, 0.0, 0.0, 200));
        let state = store.update(position_update(3, 0.0, 0.0, 50));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(3), Some(&state));
        assert!(store.get(1).is_none());
        assert!(store.get(2).is_some());
    }

    #[test]
    fn test_snapshot_is_isolated_from_updates() {
        let mut store = VesselStore::new(10);
        store.update(position_update(1, 0.0, 0.0, 100));
        let snapshot = store.snapshot();

        store.update(position_update(1, 1.0, 1.0, 200));
        store.update(position_update(2, 0.0, 0.0, 200));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[&1].position, Position::new(0.0, 0.0));
        assert_eq!(store.get(1).map(|v| v.position), Some(Position::new(1.0, 1.0)));
    }

    #[test]
    fn test_cleanup_removes_stale() {
        let mut store = VesselStore::new(10);
        store.update(position_update(1, 0.0, 0.0, 1_000));
        store.update(position_update(2, 0.0, 0.0, 50_000));

        let removed = store.cleanup(60_000, 30_000);
        assert_eq!(removed, vec![1]);
        assert_eq!(store.len(), 1);
    }
}
