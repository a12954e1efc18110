//! Pairwise Collision Sweep
//!
//! Evaluates every unordered vessel pair and reports the ones whose
//! predicted CPA/TCPA is not `Safe`.

use serde::{Deserialize, Serialize};

use super::cpa::{assess_risk, calculate_cpa, RiskLevel};
use crate::geo::distance_meters;
use crate::vessel::{VesselId, VesselState};

/// Default collision distance threshold in meters
pub const DEFAULT_COLLISION_DISTANCE_M: f64 = 500.0;

/// Pairs further apart than this multiple of the threshold skip CPA
const PREFILTER_FACTOR: f64 = 3.0;

/// Default speed change (knots) considered anomalous
pub const DEFAULT_SPEED_CHANGE_KN: f64 = 5.0;

/// Collision alert for one vessel pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionAlert {
    pub vessel1: VesselId,
    pub vessel2: VesselId,
    /// Current great-circle distance in meters
    pub distance: f64,
    /// Closest point of approach in nautical miles
    pub cpa: f64,
    /// Time to CPA in minutes
    pub tcpa: f64,
    pub severity: RiskLevel,
}

impl CollisionAlert {
    /// Unordered pair key, smaller id first
    pub fn pair(&self) -> (VesselId, VesselId) {
        if self.vessel1 <= self.vessel2 {
            (self.vessel1, self.vessel2)
        } else {
            (self.vessel2, self.vessel1)
        }
    }
}

/// Detect collision risks among all vessel pairs
///
/// Only pairs currently within `3 × threshold_m` get a full CPA evaluation.
/// The result is sorted critical → danger → warning; pairs of equal severity
/// keep input order.
pub fn detect_collisions(vessels: &[VesselState], threshold_m: f64) -> Vec<CollisionAlert> {
    let mut alerts = Vec::new();
    let prefilter = threshold_m * PREFILTER_FACTOR;

    for (i, v1) in vessels.iter().enumerate() {
        for v2 in &vessels[i + 1..] {
            let distance = distance_meters(&v1.position, &v2.position);
            if distance >= prefilter {
                continue;
            }

            let result = calculate_cpa(v1, v2);
            let severity = assess_risk(result.cpa, result.tcpa);
            log::trace!(
                "{} / {}: distance {:.0} m, cpa {:.3} NM, tcpa {:.1} min -> {}",
                v1.id,
                v2.id,
                distance,
                result.cpa,
                result.tcpa,
                severity
            );

            if severity != RiskLevel::Safe {
                alerts.push(CollisionAlert {
                    vessel1: v1.id,
                    vessel2: v2.id,
                    distance,
                    cpa: result.cpa,
                    tcpa: result.tcpa,
                    severity,
                });
            }
        }
    }

    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}

/// Check whether speed changed by more than `threshold_kn` since the previous report
pub fn detect_speed_anomaly(vessel: &VesselState, previous_speed: f64, threshold_kn: f64) -> bool {
    (vessel.speed - previous_speed).abs() > threshold_kn
}
