//! CPA/TCPA Calculation
//!
//! Computes Closest Point of Approach (CPA) and Time to CPA (TCPA)
//! between two vessels under constant-velocity extrapolation.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::geo::{meters_per_degree_longitude, KN_TO_MS, METERS_PER_DEGREE_LATITUDE, NAUTICAL_MILE};
use crate::vessel::VesselState;

/// Relative speed² (m²/s²) below which vessels are treated as moving together
const MIN_RELATIVE_SPEED_SQ: f64 = 0.001;

/// CPA threshold (NM) below which a pair leaves `Safe`
pub const WARNING_CPA_NM: f64 = 0.5;
/// TCPA threshold (minutes) below which a pair leaves `Safe`
pub const WARNING_TCPA_MIN: f64 = 30.0;
pub const DANGER_CPA_NM: f64 = 0.3;
pub const DANGER_TCPA_MIN: f64 = 15.0;
pub const CRITICAL_CPA_NM: f64 = 0.2;
pub const CRITICAL_TCPA_MIN: f64 = 10.0;

/// Result of CPA/TCPA calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpaResult {
    /// Closest Point of Approach in nautical miles
    pub cpa: f64,
    /// Time to Closest Point of Approach in minutes, never negative
    pub tcpa: f64,
}

/// Collision risk of a vessel pair, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Warning => "warning",
            RiskLevel::Danger => "danger",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Velocity vector (east, north) in m/s
fn velocity(vessel: &VesselState) -> Vector2<f64> {
    let speed_ms = vessel.speed * KN_TO_MS;
    let course_rad = vessel.course.to_radians();
    Vector2::new(speed_ms * course_rad.sin(), speed_ms * course_rad.cos())
}

/// Calculate CPA and TCPA between two vessels
///
/// Uses relative velocity method on a local flat-earth approximation:
/// 1. Relative position of `a` with respect to `b` in meters
/// 2. Relative velocity `va - vb`
/// 3. TCPA = -(r · v) / |v|², clamped to zero when already diverging
///
/// When the relative velocity is negligible the current distance is the CPA
/// and TCPA is zero.
pub fn calculate_cpa(a: &VesselState, b: &VesselState) -> CpaResult {
    let rel_pos = Vector2::new(
        (a.position.longitude - b.position.longitude)
            * meters_per_degree_longitude(a.position.latitude),
        (a.position.latitude - b.position.latitude) * METERS_PER_DEGREE_LATITUDE,
    );
    let rel_vel = velocity(a) - velocity(b);

    let v_sq = rel_vel.norm_squared();
    if v_sq < MIN_RELATIVE_SPEED_SQ {
        return CpaResult {
            cpa: rel_pos.norm() / NAUTICAL_MILE,
            tcpa: 0.0,
        };
    }

    let tcpa_s = (-rel_pos.dot(&rel_vel) / v_sq).max(0.0);
    let closest = rel_pos + rel_vel * tcpa_s;

    CpaResult {
        cpa: closest.norm() / NAUTICAL_MILE,
        tcpa: tcpa_s / 60.0,
    }
}

/// Classify collision risk from CPA (NM) and TCPA (minutes)
pub fn assess_risk(cpa: f64, tcpa: f64) -> RiskLevel {
    if cpa < WARNING_CPA_NM && tcpa < WARNING_TCPA_MIN {
        if cpa < CRITICAL_CPA_NM && tcpa < CRITICAL_TCPA_MIN {
            RiskLevel::Critical
        } else if cpa < DANGER_CPA_NM && tcpa < DANGER_TCPA_MIN {
            RiskLevel::Danger
        } else {
            RiskLevel::Warning
        }
    } else {
        RiskLevel::Safe
    }
}
