//! Density-based clustering (DBSCAN)

use std::collections::VecDeque;

use super::VesselCluster;
use crate::geo::distance_nm;
use crate::vessel::VesselState;

/// Neighbourhood radius in nautical miles (~900 m)
pub const DEFAULT_EPSILON_NM: f64 = 0.5;

/// Neighbours (excluding the vessel itself) needed to seed or extend a cluster
pub const DEFAULT_MIN_POINTS: usize = 3;

/// Cluster vessels by density.
///
/// A vessel with at least `min_points` other vessels within `epsilon_nm`
/// seeds a cluster, which then absorbs its neighbours breadth-first. Only
/// neighbours that are themselves dense keep the expansion going; the rest
/// join as border members. Vessels reached by no cluster are noise and are
/// left out of the result.
pub fn dbscan(vessels: &[VesselState], epsilon_nm: f64, min_points: usize) -> Vec<VesselCluster> {
    let neighbours = |index: usize| -> Vec<usize> {
        let origin = &vessels[index].position;
        vessels
            .iter()
            .enumerate()
            .filter(|(other, v)| *other != index && distance_nm(origin, &v.position) <= epsilon_nm)
            .map(|(other, _)| other)
            .collect()
    };

    let mut visited = vec![false; vessels.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut noise = 0usize;

    for seed in 0..vessels.len() {
        if visited[seed] {
            continue;
        }

        let seed_neighbours = neighbours(seed);
        if seed_neighbours.len() < min_points {
            // May still be absorbed later as a border member
            noise += 1;
            continue;
        }

        visited[seed] = true;
        let mut members = vec![seed];
        let mut queue: VecDeque<usize> = seed_neighbours.into();

        while let Some(current) = queue.pop_front() {
            if visited[current] {
                continue;
            }
            visited[current] = true;
            members.push(current);

            let current_neighbours = neighbours(current);
            if current_neighbours.len() >= min_points {
                queue.extend(current_neighbours.into_iter().filter(|&n| !visited[n]));
            }
        }

        groups.push(members);
    }

    log::trace!(
        "dbscan: {} vessels, {} clusters, {} unseeded",
        vessels.len(),
        groups.len(),
        noise
    );

    groups
        .into_iter()
        .enumerate()
        .map(|(index, members)| {
            let members = members.into_iter().map(|i| vessels[i].clone()).collect();
            VesselCluster::new(format!("cluster-{}", index), members)
        })
        .collect()
}
