//! Vessel Clustering
//!
//! Groups vessels into clusters with derived statistics. Two interchangeable
//! primary algorithms share one output shape:
//!
//! - **dbscan**: density-based neighbourhood expansion (O(n²) neighbour scans)
//! - **grid**: fixed lat/lon cells, O(n), grid-aligned shapes
//!
//! Post-processing steps in **post** (merge by centroid distance, filter by
//! predicates) compose with either.
//!
//! Cluster ids are positional within one run. Re-running on the next tick
//! may number the same group differently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geo::{distance_nm, Position};
use crate::vessel::VesselState;

mod dbscan;
mod grid;
mod post;

pub use dbscan::{dbscan, DEFAULT_EPSILON_NM, DEFAULT_MIN_POINTS};
pub use grid::{grid_cluster, DEFAULT_GRID_SIZE_DEG};
pub use post::{filter_clusters, merge_clusters, ClusterFilter, DEFAULT_MERGE_DISTANCE_NM};

/// A group of vessels with summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselCluster {
    pub id: String,
    pub vessels: Vec<VesselState>,
    /// Arithmetic mean of member positions
    pub center: Position,
    /// Largest member distance from the center, nautical miles
    pub radius: f64,
    /// Mean member speed, knots
    pub average_speed: f64,
    /// Vessel type -> member count
    pub vessel_types: BTreeMap<String, usize>,
}

impl VesselCluster {
    /// Build a cluster and compute its statistics. `vessels` must not be empty.
    pub fn new(id: String, vessels: Vec<VesselState>) -> Self {
        let center = cluster_center(&vessels);
        let radius = vessels
            .iter()
            .map(|v| distance_nm(&center, &v.position))
            .fold(0.0, f64::max);
        let average_speed = if vessels.is_empty() {
            0.0
        } else {
            vessels.iter().map(|v| v.speed).sum::<f64>() / vessels.len() as f64
        };
        let mut vessel_types = BTreeMap::new();
        for v in &vessels {
            *vessel_types.entry(v.vessel_type.clone()).or_insert(0) += 1;
        }

        VesselCluster {
            id,
            vessels,
            center,
            radius,
            average_speed,
            vessel_types,
        }
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

fn cluster_center(vessels: &[VesselState]) -> Position {
    if vessels.is_empty() {
        return Position::default();
    }
    let n = vessels.len() as f64;
    let (lat, lon) = vessels.iter().fold((0.0, 0.0), |(lat, lon), v| {
        (lat + v.position.latitude, lon + v.position.longitude)
    });
    Position::new(lat / n, lon / n)
}

/// Primary clustering algorithm and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "camelCase")]
pub enum ClusterAlgorithm {
    #[serde(rename_all = "camelCase")]
    Dbscan { epsilon_nm: f64, min_points: usize },
    #[serde(rename_all = "camelCase")]
    Grid { cell_size_deg: f64 },
}

impl ClusterAlgorithm {
    pub fn run(&self, vessels: &[VesselState]) -> Vec<VesselCluster> {
        match *self {
            ClusterAlgorithm::Dbscan {
                epsilon_nm,
                min_points,
            } => dbscan(vessels, epsilon_nm, min_points),
            ClusterAlgorithm::Grid { cell_size_deg } => grid_cluster(vessels, cell_size_deg),
        }
    }
}

impl Default for ClusterAlgorithm {
    fn default() -> Self {
        ClusterAlgorithm::Dbscan {
            epsilon_nm: DEFAULT_EPSILON_NM,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_statistics() {
        let vessels = vec![
            VesselState::new(1, Position::new(0.0, 0.0), 0.0, 10.0, 0).with_type("Cargo"),
            VesselState::new(2, Position::new(0.0, 0.02), 0.0, 20.0, 0).with_type("Cargo"),
            VesselState::new(3, Position::new(0.02, 0.01), 0.0, 0.0, 0).with_type("Tanker"),
        ];
        let cluster = VesselCluster::new("c".to_string(), vessels);

        assert!((cluster.center.latitude - 0.02 / 3.0).abs() < 1e-12);
        assert!((cluster.center.longitude - 0.01).abs() < 1e-12);
        assert!((cluster.average_speed - 10.0).abs() < 1e-12);
        assert_eq!(cluster.vessel_types.get("Cargo"), Some(&2));
        assert_eq!(cluster.vessel_types.get("Tanker"), Some(&1));

        // Radius is the furthest member, here vessel 3 (~0.8 NM)
        let expected = distance_nm(&cluster.center, &Position::new(0.02, 0.01));
        assert!((cluster.radius - expected).abs() < 1e-12);
    }

    #[test]
    fn test_algorithm_from_json() {
        let json = r#"{ "algorithm": "grid", "cellSizeDeg": 0.05 }"#;
        let algorithm: ClusterAlgorithm = serde_json::from_str(json).unwrap();
        assert_eq!(algorithm, ClusterAlgorithm::Grid { cell_size_deg: 0.05 });
        assert_eq!(
            ClusterAlgorithm::default(),
            ClusterAlgorithm::Dbscan {
                epsilon_nm: 0.5,
                min_points: 3
            }
        );
    }
}
