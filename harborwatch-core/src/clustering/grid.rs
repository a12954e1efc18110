//! Grid-based clustering
//!
//! Buckets vessels into fixed lat/lon cells. Linear time and deterministic,
//! but cluster boundaries follow the grid: two vessels a few metres apart on
//! either side of a cell edge never share a cluster.

use std::collections::BTreeMap;

use super::VesselCluster;
use crate::vessel::VesselState;

/// Cell size in degrees (~11 km of latitude)
pub const DEFAULT_GRID_SIZE_DEG: f64 = 0.1;

/// Cells need at least this many vessels to form a cluster
const MIN_CELL_VESSELS: usize = 2;

fn cell_of(vessel: &VesselState, cell_size_deg: f64) -> (i64, i64) {
    (
        (vessel.position.latitude / cell_size_deg).floor() as i64,
        (vessel.position.longitude / cell_size_deg).floor() as i64,
    )
}

/// Group vessels sharing a grid cell, largest clusters first
pub fn grid_cluster(vessels: &[VesselState], cell_size_deg: f64) -> Vec<VesselCluster> {
    if cell_size_deg.is_nan() || cell_size_deg <= 0.0 {
        log::warn!("Invalid grid cell size {}, no clusters", cell_size_deg);
        return Vec::new();
    }

    let mut cells: BTreeMap<(i64, i64), Vec<VesselState>> = BTreeMap::new();
    for vessel in vessels {
        cells
            .entry(cell_of(vessel, cell_size_deg))
            .or_default()
            .push(vessel.clone());
    }

    let mut groups: Vec<Vec<VesselState>> = cells
        .into_values()
        .filter(|members| members.len() >= MIN_CELL_VESSELS)
        .collect();
    groups.sort_by(|a, b| b.len().cmp(&a.len()));

    groups
        .into_iter()
        .enumerate()
        .map(|(index, members)| VesselCluster::new(format!("grid-cluster-{}", index), members))
        .collect()
}
