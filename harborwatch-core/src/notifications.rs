//! Notification Center
//!
//! Turns collision alerts, speed anomalies and zone events into user-facing
//! notifications, keeps a capped list (newest first) and tracks read state.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::collision::{CollisionAlert, RiskLevel, DEFAULT_COLLISION_DISTANCE_M, DEFAULT_SPEED_CHANGE_KN};
use crate::geofence::{ZoneEvent, ZoneEventType};
use crate::vessel::{VesselId, VesselState};

/// Default number of notifications kept
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Collision,
    Speed,
    Zone,
    Vessel,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl From<RiskLevel> for NotificationPriority {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Critical => NotificationPriority::Critical,
            RiskLevel::Danger => NotificationPriority::High,
            RiskLevel::Warning => NotificationPriority::Medium,
            RiskLevel::Safe => NotificationPriority::Low,
        }
    }
}

/// Optional context attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_id: Option<VesselId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_name: Option<String>,
    /// Meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Nautical miles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpa: Option<f64>,
    /// Minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcpa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Knots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    /// Milliseconds since epoch, set when added to a center
    pub timestamp: u64,
    pub read: bool,
    #[serde(default)]
    pub data: NotificationData,
}

impl Notification {
    /// Unsent notification; id and timestamp are assigned by `NotificationCenter::add`
    pub fn new(
        kind: NotificationKind,
        priority: NotificationPriority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Notification {
            id: 0,
            kind,
            priority,
            title: title.into(),
            message: message.into(),
            timestamp: 0,
            read: false,
            data: NotificationData::default(),
        }
    }

    pub fn with_data(mut self, data: NotificationData) -> Self {
        self.data = data;
        self
    }

    pub fn collision(alert: &CollisionAlert, vessel1: &VesselState, vessel2: &VesselState) -> Self {
        Notification::new(
            NotificationKind::Collision,
            alert.severity.into(),
            "Collision warning",
            format!(
                "{} and {} are closing ({:.0} m, CPA {:.2} NM in {:.1} min)",
                vessel1.name, vessel2.name, alert.distance, alert.cpa, alert.tcpa
            ),
        )
        .with_data(NotificationData {
            vessel_id: Some(vessel1.id),
            vessel_name: Some(vessel1.name.clone()),
            distance: Some(alert.distance),
            cpa: Some(alert.cpa),
            tcpa: Some(alert.tcpa),
            ..Default::default()
        })
    }

    pub fn speed_change(vessel: &VesselState, previous_speed: f64) -> Self {
        Notification::new(
            NotificationKind::Speed,
            NotificationPriority::Medium,
            "Speed change",
            format!(
                "{} changed speed sharply ({:.1} -> {:.1} kn)",
                vessel.name, previous_speed, vessel.speed
            ),
        )
        .with_data(NotificationData {
            vessel_id: Some(vessel.id),
            vessel_name: Some(vessel.name.clone()),
            speed: Some(vessel.speed),
            ..Default::default()
        })
    }

    pub fn zone_event(event: &ZoneEvent) -> Self {
        let (title, verb) = match event.event_type {
            ZoneEventType::Enter => ("Zone entry", "entered"),
            ZoneEventType::Exit => ("Zone exit", "left"),
            ZoneEventType::Dwell => ("Zone dwell", "is dwelling in"),
        };
        Notification::new(
            NotificationKind::Zone,
            NotificationPriority::Medium,
            title,
            format!("{} {} {}", event.vessel_name, verb, event.zone_name),
        )
        .with_data(NotificationData {
            vessel_id: Some(event.vessel_id),
            vessel_name: Some(event.vessel_name.clone()),
            zone: Some(event.zone_name.clone()),
            ..Default::default()
        })
    }
}

/// Per-kind toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationKinds {
    pub collision: bool,
    pub speed: bool,
    pub zone: bool,
    pub vessel: bool,
    pub info: bool,
}

impl NotificationKinds {
    pub fn is_enabled(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Collision => self.collision,
            NotificationKind::Speed => self.speed,
            NotificationKind::Zone => self.zone,
            NotificationKind::Vessel => self.vessel,
            NotificationKind::Info => self.info,
        }
    }
}

impl Default for NotificationKinds {
    fn default() -> Self {
        NotificationKinds {
            collision: true,
            speed: true,
            zone: true,
            vessel: true,
            info: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationThresholds {
    /// Meters
    pub collision_distance: f64,
    /// Knots
    pub speed_change: f64,
}

impl Default for NotificationThresholds {
    fn default() -> Self {
        NotificationThresholds {
            collision_distance: DEFAULT_COLLISION_DISTANCE_M,
            speed_change: DEFAULT_SPEED_CHANGE_KN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub types: NotificationKinds,
    pub thresholds: NotificationThresholds,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            types: NotificationKinds::default(),
            thresholds: NotificationThresholds::default(),
        }
    }
}

impl NotificationSettings {
    pub fn accepts(&self, kind: NotificationKind) -> bool {
        self.enabled && self.types.is_enabled(kind)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationCenter {
    settings: NotificationSettings,
    /// Newest first
    notifications: VecDeque<Notification>,
    capacity: usize,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new(settings: NotificationSettings, capacity: usize) -> Self {
        NotificationCenter {
            settings,
            notifications: VecDeque::new(),
            capacity,
            next_id: 1,
        }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: NotificationSettings) {
        self.settings = settings;
    }

    /// Add a notification unless its kind is switched off.
    ///
    /// Returns the stored notification with its assigned id and timestamp.
    pub fn add(&mut self, mut notification: Notification, now: u64) -> Option<&Notification> {
        if !self.settings.accepts(notification.kind) {
            log::trace!("Dropped {:?} notification", notification.kind);
            return None;
        }

        notification.id = self.next_id;
        notification.timestamp = now;
        notification.read = false;
        self.next_id += 1;

        log::debug!(
            "Notification {} ({:?}): {}",
            notification.id,
            notification.priority,
            notification.message
        );

        self.notifications.push_front(notification);
        self.notifications.truncate(self.capacity);
        self.notifications.front()
    }

    /// Returns false if no notification has this id
    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for notification in self.notifications.iter_mut() {
            notification.read = true;
        }
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    pub fn clear_all(&mut self) {
        self.notifications.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Newest first
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationSettings::default(), DEFAULT_NOTIFICATION_CAPACITY)
    }
}
