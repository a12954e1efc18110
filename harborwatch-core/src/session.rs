//! Monitoring Session
//!
//! Owns every stateful store (vessels, zones, tracks, alert suppression,
//! notifications) for one monitoring session. Feed updates go in through
//! `ingest`; `tick` runs one sweep of all derived views over a consistent
//! vessel snapshot.
//!
//! # Example
//!
//! ```rust,ignore
//! use harborwatch_core::session::{Session, SessionSettings};
//!
//! let mut session = Session::new(SessionSettings::default());
//! session.tracks_mut().follow(440123456);
//!
//! for update in feed {
//!     session.ingest(update);
//! }
//!
//! let report = session.tick(now);
//! for alert in &report.alerts {
//!     println!("{} / {}: {}", alert.vessel1, alert.vessel2, alert.severity);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clustering::{
    filter_clusters, merge_clusters, ClusterAlgorithm, ClusterFilter, VesselCluster,
};
use crate::collision::{detect_collisions, detect_speed_anomaly, AlertSuppressor, CollisionAlert};
use crate::geofence::{GeofenceEvaluator, ZoneEvent, DEFAULT_EVENT_LOG_CAPACITY};
use crate::notifications::{
    Notification, NotificationCenter, NotificationSettings, DEFAULT_NOTIFICATION_CAPACITY,
};
use crate::tracks::{TrackStore, VesselTrack};
use crate::vessel::{VesselId, VesselState, VesselStore, VesselUpdate, DEFAULT_STORE_CAPACITY};

const MS_PER_MINUTE: u64 = 60 * 1000;

/// Session tuning, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Maximum number of vessels kept
    pub vessel_capacity: usize,

    /// Vessels without an update for this long are dropped
    pub stale_vessel_minutes: u64,

    /// Minimum time between two alerts for the same vessel pair
    pub alert_cooldown_minutes: u64,

    /// Primary clustering algorithm
    pub clustering: ClusterAlgorithm,

    /// Merge clusters whose centers are closer than this (nautical miles)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_merge_nm: Option<f64>,

    pub cluster_filter: ClusterFilter,

    pub event_log_capacity: usize,

    pub notification_capacity: usize,

    pub notifications: NotificationSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            vessel_capacity: DEFAULT_STORE_CAPACITY,
            stale_vessel_minutes: 10,
            alert_cooldown_minutes: 5,
            clustering: ClusterAlgorithm::default(),
            cluster_merge_nm: None,
            cluster_filter: ClusterFilter::default(),
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            notifications: NotificationSettings::default(),
        }
    }
}

impl SessionSettings {
    pub fn stale_after_ms(&self) -> u64 {
        self.stale_vessel_minutes * MS_PER_MINUTE
    }

    pub fn alert_cooldown_ms(&self) -> u64 {
        self.alert_cooldown_minutes * MS_PER_MINUTE
    }
}

/// Everything one `tick` produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub timestamp: u64,
    /// Vessels removed as stale before the sweep
    pub removed: Vec<VesselId>,
    /// Collision alerts that passed repeat suppression, most severe first
    pub alerts: Vec<CollisionAlert>,
    pub zone_events: Vec<ZoneEvent>,
    pub clusters: Vec<VesselCluster>,
    /// Tracks that started or gained a point
    pub tracks: Vec<VesselTrack>,
    /// Notifications added during this tick, oldest first
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct Session {
    settings: SessionSettings,
    vessels: VesselStore,
    geofence: GeofenceEvaluator,
    tracks: TrackStore,
    suppressor: AlertSuppressor,
    notifications: NotificationCenter,
    /// Speed seen at the previous tick, for anomaly detection
    previous_speeds: BTreeMap<VesselId, f64>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Session {
            vessels: VesselStore::new(settings.vessel_capacity),
            geofence: GeofenceEvaluator::new(settings.event_log_capacity),
            tracks: TrackStore::new(),
            suppressor: AlertSuppressor::new(settings.alert_cooldown_ms()),
            notifications: NotificationCenter::new(
                settings.notifications,
                settings.notification_capacity,
            ),
            previous_speeds: BTreeMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn vessels(&self) -> &VesselStore {
        &self.vessels
    }

    pub fn geofence(&self) -> &GeofenceEvaluator {
        &self.geofence
    }

    pub fn geofence_mut(&mut self) -> &mut GeofenceEvaluator {
        &mut self.geofence
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut TrackStore {
        &mut self.tracks
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    /// Apply one feed update to the vessel store
    pub fn ingest(&mut self, update: VesselUpdate) -> VesselState {
        self.vessels.update(update)
    }

    /// Run one sweep over the current vessel snapshot
    pub fn tick(&mut self, now: u64) -> TickReport {
        let mut report = TickReport {
            timestamp: now,
            ..Default::default()
        };
        let notified_before = self.notifications.len();
        let mut added = Vec::new();

        // ---- Stale vessels ----

        report.removed = self.vessels.cleanup(now, self.settings.stale_after_ms());
        if !report.removed.is_empty() {
            self.geofence.forget_vessels(&report.removed);
            for id in &report.removed {
                self.previous_speeds.remove(id);
            }
        }

        let snapshot = self.vessels.snapshot();
        // Vessels known only from static data have no position yet
        let vessels: Vec<VesselState> = snapshot
            .values()
            .filter(|v| v.has_position)
            .cloned()
            .collect();
        let thresholds = self.settings.notifications.thresholds;

        // ---- Collisions ----

        let alerts = detect_collisions(&vessels, thresholds.collision_distance);
        report.alerts = self.suppressor.filter(alerts, now);
        for alert in &report.alerts {
            if let (Some(a), Some(b)) = (snapshot.get(&alert.vessel1), snapshot.get(&alert.vessel2)) {
                added.extend(self.notify(Notification::collision(alert, a, b), now));
            }
        }

        // ---- Zones ----

        report.zone_events = self.geofence.evaluate(&vessels, now);
        for event in &report.zone_events {
            added.extend(self.notify(Notification::zone_event(event), now));
        }

        // ---- Speed ----

        for vessel in &vessels {
            if let Some(previous) = self.previous_speeds.insert(vessel.id, vessel.speed) {
                if detect_speed_anomaly(vessel, previous, thresholds.speed_change) {
                    added.extend(self.notify(Notification::speed_change(vessel, previous), now));
                }
            }
        }

        // ---- Tracks ----

        let changed = self.tracks.update(&vessels);
        report.tracks = changed
            .into_iter()
            .filter_map(|id| self.tracks.track(id).cloned())
            .collect();

        // ---- Clusters ----

        let mut clusters = self.settings.clustering.run(&vessels);
        if let Some(merge_nm) = self.settings.cluster_merge_nm {
            clusters = merge_clusters(clusters, merge_nm);
        }
        report.clusters = filter_clusters(clusters, &self.settings.cluster_filter);

        report.notifications = added;

        log::debug!(
            "Tick at {}: {} vessels, {} alerts, {} zone events, {} clusters, {} new notifications ({} total)",
            now,
            vessels.len(),
            report.alerts.len(),
            report.zone_events.len(),
            report.clusters.len(),
            report.notifications.len(),
            notified_before + report.notifications.len(),
        );

        report
    }

    fn notify(&mut self, notification: Notification, now: u64) -> Option<Notification> {
        self.notifications.add(notification, now).cloned()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}
