//! Collision Risk Prediction
//!
//! Pairwise CPA/TCPA prediction between vessels, risk classification and a
//! batch sweep over a vessel snapshot.
//!
//! # Architecture
//!
//! - **cpa**: relative-motion CPA/TCPA and the fixed risk thresholds
//! - **detector**: all-pairs sweep with a distance pre-filter
//! - **suppressor**: per-pair cooldown so callers notify once per encounter
//!
//! The sweep itself is stateless; repeat suppression lives in
//! [`AlertSuppressor`] which the caller owns.
//!
//! # Example
//!
//! ```rust,ignore
//! use harborwatch_core::collision::{detect_collisions, AlertSuppressor};
//!
//! let mut suppressor = AlertSuppressor::default();
//! let alerts = detect_collisions(&vessels, 500.0);
//! for alert in suppressor.filter(alerts, now) {
//!     println!("{} / {}: {}", alert.vessel1, alert.vessel2, alert.severity);
//! }
//! ```

mod cpa;
mod detector;
mod suppressor;

pub use cpa::{
    assess_risk, calculate_cpa, CpaResult, RiskLevel, CRITICAL_CPA_NM, CRITICAL_TCPA_MIN,
    DANGER_CPA_NM, DANGER_TCPA_MIN, WARNING_CPA_NM, WARNING_TCPA_MIN,
};
pub use detector::{
    detect_collisions, detect_speed_anomaly, CollisionAlert, DEFAULT_COLLISION_DISTANCE_M,
    DEFAULT_SPEED_CHANGE_KN,
};
pub use suppressor::{AlertSuppressor, DEFAULT_ALERT_COOLDOWN_MS};
