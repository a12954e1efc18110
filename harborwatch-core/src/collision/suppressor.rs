//! Repeat-alert suppression
//!
//! The detector returns every risky pair on every sweep. This wrapper lets
//! an alert for a given unordered pair through once, then holds further
//! alerts for that pair back until the cooldown expires.

use std::collections::HashMap;

use super::detector::CollisionAlert;
use crate::vessel::VesselId;

/// Default cooldown before the same pair may alert again (5 minutes)
pub const DEFAULT_ALERT_COOLDOWN_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct AlertSuppressor {
    cooldown_ms: u64,
    /// Pair -> time the pair was last let through
    last_alerted: HashMap<(VesselId, VesselId), u64>,
}

impl AlertSuppressor {
    pub fn new(cooldown_ms: u64) -> Self {
        AlertSuppressor {
            cooldown_ms,
            last_alerted: HashMap::new(),
        }
    }

    /// Returns true (and starts the cooldown) if this pair may alert now
    pub fn should_alert(&mut self, alert: &CollisionAlert, now: u64) -> bool {
        let pair = alert.pair();
        match self.last_alerted.get(&pair) {
            Some(&at) if now.saturating_sub(at) < self.cooldown_ms => false,
            _ => {
                self.last_alerted.insert(pair, now);
                true
            }
        }
    }

    /// Keep only alerts whose pair is not cooling down
    pub fn filter(&mut self, alerts: Vec<CollisionAlert>, now: u64) -> Vec<CollisionAlert> {
        self.prune(now);
        alerts
            .into_iter()
            .filter(|alert| self.should_alert(alert, now))
            .collect()
    }

    /// Forget pairs whose cooldown has expired
    pub fn prune(&mut self, now: u64) {
        let cooldown = self.cooldown_ms;
        self.last_alerted
            .retain(|_, at| now.saturating_sub(*at) < cooldown);
    }

    pub fn is_suppressed(&self, a: VesselId, b: VesselId, now: u64) -> bool {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.last_alerted
            .get(&pair)
            .is_some_and(|&at| now.saturating_sub(at) < self.cooldown_ms)
    }

    pub fn clear(&mut self) {
        self.last_alerted.clear();
    }

    pub fn len(&self) -> usize {
        self.last_alerted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alerted.is_empty()
    }
}

impl Default for AlertSuppressor {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_COOLDOWN_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::RiskLevel;

    fn alert(v1: VesselId, v2: VesselId) -> CollisionAlert {
        CollisionAlert {
            vessel1: v1,
            vessel2: v2,
            distance: 300.0,
            cpa: 0.1,
            tcpa: 2.0,
            severity: RiskLevel::Critical,
        }
    }

    #[test]
    fn test_repeat_suppressed_within_cooldown() {
        let mut suppressor = AlertSuppressor::new(60_000);
        assert!(suppressor.should_alert(&alert(1, 2), 0));
        assert!(!suppressor.should_alert(&alert(1, 2), 30_000));
        // Pair is unordered
        assert!(!suppressor.should_alert(&alert(2, 1), 30_000));
        assert!(suppressor.is_suppressed(2, 1, 59_999));
    }

    #[test]
    fn test_alert_again_after_cooldown() {
        let mut suppressor = AlertSuppressor::new(60_000);
        assert!(suppressor.should_alert(&alert(1, 2), 0));
        assert!(suppressor.should_alert(&alert(1, 2), 60_000));
        assert!(!suppressor.should_alert(&alert(1, 2), 90_000));
    }

    #[test]
    fn test_filter_batch() {
        let mut suppressor = AlertSuppressor::default();
        let first = suppressor.filter(vec![alert(1, 2), alert(3, 4)], 1_000);
        assert_eq!(first.len(), 2);

        let second = suppressor.filter(vec![alert(1, 2), alert(5, 6)], 2_000);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].pair(), (5, 6));

        // Everything expired: pruned, then let through again
        let later = 2_000 + DEFAULT_ALERT_COOLDOWN_MS;
        suppressor.prune(later);
        assert!(suppressor.is_empty());
    }
}
