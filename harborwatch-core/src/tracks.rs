//! Vessel Track History
//!
//! Stores position history for followed vessels and integrates the distance
//! travelled along the recorded points.
//!
//! # Example
//!
//! ```rust,ignore
//! use harborwatch_core::tracks::TrackStore;
//!
//! let mut tracks = TrackStore::new();
//! tracks.follow(440123456);
//!
//! // On every vessel batch
//! tracks.update(&vessels);
//!
//! if let Some(track) = tracks.track(440123456) {
//!     println!("{} points, {:.2} NM", track.points.len(), track.total_distance);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::geo::{distance_nm, Position};
use crate::vessel::{VesselId, VesselState};

/// Maximum number of points kept per track
pub const MAX_TRACK_POINTS: usize = 100;

/// A new point is only recorded when latitude or longitude moved more than
/// this many degrees (~10 m)
pub const MIN_POSITION_DELTA_DEG: f64 = 0.0001;

/// Single recorded track point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub position: Position,
    /// Milliseconds since epoch
    pub timestamp: u64,
    /// Knots
    pub speed: f64,
    /// Degrees
    pub course: f64,
}

impl From<&VesselState> for TrackPoint {
    fn from(vessel: &VesselState) -> Self {
        TrackPoint {
            position: vessel.position,
            timestamp: vessel.last_update,
            speed: vessel.speed,
            course: vessel.course,
        }
    }
}

/// Track of one vessel, oldest point first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselTrack {
    pub vessel_id: VesselId,
    pub points: VecDeque<TrackPoint>,
    pub start_time: u64,
    /// Nautical miles travelled since the track started. Not reduced when old
    /// points are dropped.
    pub total_distance: f64,
}

impl VesselTrack {
    /// Start a track at the vessel's current position
    pub fn start(vessel: &VesselState) -> Self {
        let mut points = VecDeque::with_capacity(MAX_TRACK_POINTS);
        points.push_back(TrackPoint::from(vessel));
        VesselTrack {
            vessel_id: vessel.id,
            points,
            start_time: vessel.last_update,
            total_distance: 0.0,
        }
    }

    /// Append the vessel's position if it moved far enough.
    ///
    /// Returns true if a point was recorded.
    pub fn advance(&mut self, vessel: &VesselState) -> bool {
        let point = TrackPoint::from(vessel);
        let Some(last) = self.points.back() else {
            self.points.push_back(point);
            return true;
        };

        let moved = (last.position.latitude - point.position.latitude).abs()
            > MIN_POSITION_DELTA_DEG
            || (last.position.longitude - point.position.longitude).abs()
                > MIN_POSITION_DELTA_DEG;
        if !moved {
            return false;
        }

        self.total_distance += distance_nm(&last.position, &point.position);
        self.points.push_back(point);
        if self.points.len() > MAX_TRACK_POINTS {
            self.points.pop_front();
        }
        true
    }

    pub fn last_point(&self) -> Option<&TrackPoint> {
        self.points.back()
    }
}

/// Tracks of all followed vessels
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    following: BTreeSet<VesselId>,
    tracks: BTreeMap<VesselId, VesselTrack>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording a vessel. The track begins with the next update.
    pub fn follow(&mut self, vessel_id: VesselId) {
        if self.following.insert(vessel_id) {
            log::debug!("Following vessel {}", vessel_id);
        }
    }

    /// Stop recording a vessel and discard its track
    pub fn unfollow(&mut self, vessel_id: VesselId) {
        self.following.remove(&vessel_id);
        if self.tracks.remove(&vessel_id).is_some() {
            log::debug!("Discarded track of vessel {}", vessel_id);
        }
    }

    pub fn is_following(&self, vessel_id: VesselId) -> bool {
        self.following.contains(&vessel_id)
    }

    pub fn following(&self) -> impl Iterator<Item = VesselId> + '_ {
        self.following.iter().copied()
    }

    /// Advance every followed vessel present in `vessels`.
    ///
    /// Returns the ids of tracks that started or gained a point.
    pub fn update(&mut self, vessels: &[VesselState]) -> Vec<VesselId> {
        let mut changed = Vec::new();
        for vessel in vessels.iter().filter(|v| self.following.contains(&v.id)) {
            let recorded = match self.tracks.get_mut(&vessel.id) {
                Some(track) => track.advance(vessel),
                None => {
                    self.tracks.insert(vessel.id, VesselTrack::start(vessel));
                    true
                }
            };
            if recorded {
                changed.push(vessel.id);
            }
        }
        if !changed.is_empty() {
            log::trace!("Updated {} tracks", changed.len());
        }
        changed
    }

    pub fn track(&self, vessel_id: VesselId) -> Option<&VesselTrack> {
        self.tracks.get(&vessel_id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &VesselTrack> {
        self.tracks.values()
    }

    /// Drop the recorded points; following continues with a fresh track
    pub fn clear_track(&mut self, vessel_id: VesselId) {
        self.tracks.remove(&vessel_id);
    }

    /// Drop every track and stop following all vessels
    pub fn clear_all(&mut self) {
        self.tracks.clear();
        self.following.clear();
    }
}
