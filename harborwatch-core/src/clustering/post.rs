//! Cluster post-processing: merging and filtering
//!
//! Both steps take the output of either primary algorithm and return a new
//! list; they never look at vessels that were not already clustered.

use serde::{Deserialize, Serialize};

use super::VesselCluster;
use crate::geo::distance_nm;

/// Clusters whose centers are within this many nautical miles are merged
pub const DEFAULT_MERGE_DISTANCE_NM: f64 = 1.0;

/// Merge clusters whose centers lie within `merge_distance_nm` of each other.
///
/// Greedy single pass: each unprocessed cluster absorbs every other
/// unprocessed cluster near its own center. Statistics are recomputed
/// for the merged set. Output is sorted by member count, largest
/// first.
pub fn merge_clusters(clusters: Vec<VesselCluster>, merge_distance_nm: f64) -> Vec<VesselCluster> {
    if clusters.len() <= 1 {
        return clusters;
    }

    let mut processed = vec![false; clusters.len()];
    let mut groups = Vec::new();

    for i in 0..clusters.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let mut vessels = clusters[i].vessels.clone();
        for j in 0..clusters.len() {
            if processed[j] {
                continue;
            }
            if distance_nm(&clusters[i].center, &clusters[j].center) <= merge_distance_nm {
                vessels.extend(clusters[j].vessels.iter().cloned());
                processed[j] = true;
            }
        }
        groups.push(vessels);
    }

    log::trace!("Merged {} clusters into {}", clusters.len(), groups.len());

    let mut merged: Vec<VesselCluster> = groups
        .into_iter()
        .enumerate()
        .map(|(index, vessels)| VesselCluster::new(format!("merged-{}", index), vessels))
        .collect();
    merged.sort_by(|a, b| b.len().cmp(&a.len()));
    merged
}

/// Predicates for `filter_clusters`. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterFilter {
    pub min_vessels: Option<usize>,
    pub max_vessels: Option<usize>,
    /// Knots, compared against the cluster average speed
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    /// Keep clusters containing at least one of these vessel types
    pub vessel_types: Vec<String>,
}

impl ClusterFilter {
    pub fn matches(&self, cluster: &VesselCluster) -> bool {
        if self.min_vessels.map_or(false, |min| cluster.len() < min) {
            return false;
        }
        if self.max_vessels.map_or(false, |max| cluster.len() > max) {
            return false;
        }
        if self.min_speed.map_or(false, |min| cluster.average_speed < min) {
            return false;
        }
        if self.max_speed.map_or(false, |max| cluster.average_speed > max) {
            return false;
        }
        self.vessel_types.is_empty()
            || self
                .vessel_types
                .iter()
                .any(|t| cluster.vessel_types.contains_key(t))
    }
}

/// Keep only clusters matching every set predicate
pub fn filter_clusters(clusters: Vec<VesselCluster>, filter: &ClusterFilter) -> Vec<VesselCluster> {
    clusters.into_iter().filter(|c| filter.matches(c)).collect()
}
