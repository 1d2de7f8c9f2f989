//! Cluster management - grouping, splitting, and merging same-type pieces
//!
//! At every quiescent point the clusters of a clustered type are exactly the 4-connected
//! components of that type's pieces. Moves can only merge clusters (a cluster always moves
//! whole); losses to hazards can split them. [`split_cluster`] and [`connect_ducklings`]
//! additionally transmute pieces between DUCK and DUCKLING.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::board::{Board, ClusterId, PieceId};
use crate::types::PieceType;

/// Pieces swapped out by a transmutation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transmutation {
    /// Ids that left the board
    pub discarded: Vec<PieceId>,
    /// Ids created in their place, same order and coordinates
    pub created: Vec<PieceId>,
    /// Clusters formed by the operation
    pub clusters: Vec<ClusterId>,
}

impl Transmutation {
    pub fn is_empty(&self) -> bool {
        self.discarded.is_empty() && self.created.is_empty()
    }
}

/// A broken partition, found by [`check_partition`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterInvariantError {
    #[error("piece {0:?} has no cluster")]
    Unclustered(PieceId),
    #[error("piece {piece:?} points at missing cluster {cluster:?}")]
    MissingCluster { piece: PieceId, cluster: ClusterId },
    #[error("cluster {cluster:?} holds dead or foreign piece {piece:?}")]
    StaleMember { cluster: ClusterId, piece: PieceId },
    #[error("cluster {cluster:?} does not match the connected component of {piece:?}")]
    NotComponent { cluster: ClusterId, piece: PieceId },
    #[error("cluster {0:?} is empty")]
    Empty(ClusterId),
}

/// Flood fill from `start` over same-type 4-neighbours accepted by `keep`
fn flood(board: &Board, start: PieceId, keep: impl Fn(PieceId) -> bool) -> Vec<PieceId> {
    let Some(kind) = board.piece(start).map(|p| p.kind()) else {
        return Vec::new();
    };
    let mut found = vec![start];
    let mut seen = HashSet::from([start]);
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        for next in board.get_bordering_pieces(current, kind) {
            if keep(next) && seen.insert(next) {
                found.push(next);
                stack.push(next);
            }
        }
    }
    found
}

/// The connected same-type component containing `id`, in discovery order
pub fn group(board: &Board, id: PieceId) -> Vec<PieceId> {
    flood(board, id, |_| true)
}

/// Partition every piece of `kind` into fresh clusters
pub fn build_clusters(board: &mut Board, kind: PieceType) -> Vec<ClusterId> {
    let mut assigned = HashSet::new();
    let mut formed = Vec::new();

    for id in board.pieces_of(kind).to_vec() {
        if assigned.contains(&id) {
            continue;
        }
        let members = group(board, id);
        assigned.extend(members.iter().copied());
        formed.extend(board.form_cluster(members));
    }

    debug!(kind = kind.as_str(), clusters = formed.len(), "built clusters");
    formed
}

/// Re-partition the components containing `seeds`.
///
/// Any cluster that loses members along the way is re-partitioned as well, so the result
/// is exact for every piece reachable from the seeds through old cluster membership.
pub fn regroup(board: &mut Board, seeds: &[PieceId]) -> Vec<ClusterId> {
    let mut queue: Vec<PieceId> = seeds.iter().rev().copied().collect();
    let mut handled = HashSet::new();
    let mut formed = Vec::new();

    while let Some(seed) = queue.pop() {
        if handled.contains(&seed) || !board.contains(seed) {
            continue;
        }
        let members = group(board, seed);
        handled.extend(members.iter().copied());

        let current: BTreeSet<PieceId> = members.iter().copied().collect();
        let already_exact = board
            .cluster_of(seed)
            .is_some_and(|c| c.len() == current.len() && c.pieces().iter().all(|m| current.contains(m)));
        if already_exact {
            continue;
        }

        let previous: BTreeSet<ClusterId> = members
            .iter()
            .filter_map(|&m| board.piece(m).and_then(|p| p.cluster()))
            .collect();
        formed.extend(board.form_cluster(members));

        // Leftovers of a cluster we took members from may have come apart.
        for cid in previous {
            if let Some(rest) = board.cluster(cid) {
                queue.extend(rest.pieces().iter().rev().copied());
            }
        }
    }
    formed
}

/// Re-partition a cluster after it lost members.
///
/// Killed members leave the cluster first; if none survive, the cluster is dissolved. For
/// DUCK clusters with more than one surviving component, the largest component stays (ties
/// go to the first discovered) and every smaller one decays into DUCKLINGs, which then merge
/// with any duckling cluster they touch.
pub fn split_cluster(board: &mut Board, cid: ClusterId) -> Transmutation {
    let Some(cluster) = board.cluster(cid) else {
        return Transmutation::default();
    };
    let kind = cluster.kind();
    let (members, killed): (Vec<PieceId>, Vec<PieceId>) = cluster
        .pieces()
        .iter()
        .copied()
        .partition(|&m| board.piece(m).is_some_and(|p| !p.killed()));
    for id in killed {
        board.leave_cluster(id);
    }

    let mut remaining: HashSet<PieceId> = members.iter().copied().collect();
    let mut components: Vec<Vec<PieceId>> = Vec::new();
    for &member in &members {
        if !remaining.contains(&member) {
            continue;
        }
        let component = flood(board, member, |p| remaining.contains(&p));
        for p in &component {
            remaining.remove(p);
        }
        components.push(component);
    }

    let mut result = Transmutation::default();
    if kind == PieceType::Duck && components.len() > 1 {
        // Stable: equal sizes keep discovery order.
        components.sort_by(|a, b| b.len().cmp(&a.len()));
        let mut iter = components.into_iter();
        if let Some(largest) = iter.next() {
            result.clusters.extend(board.form_cluster(largest));
        }

        for component in iter {
            let mut ducklings = Vec::with_capacity(component.len());
            for duck in component {
                let Some(old) = board.discard_piece(duck) else {
                    continue;
                };
                result.discarded.push(duck);
                if let Some(id) = board.create_piece(PieceType::Duckling, old.x(), old.y()) {
                    ducklings.push(id);
                }
            }
            result.created.extend(ducklings.iter().copied());
            result.clusters.extend(board.form_cluster(ducklings));
        }

        let merged = regroup(board, &result.created);
        result.clusters.extend(merged);
        debug!(
            decayed = result.discarded.len(),
            "duck cluster split, smaller parts became ducklings"
        );
    } else if components.len() > 1 {
        for component in components {
            result.clusters.extend(board.form_cluster(component));
        }
    }

    result.clusters.retain(|&c| board.cluster(c).is_some());
    result
}

/// Turn every duckling cluster touching one of `ducks` into ducks.
///
/// The ducks and the converted pieces are then regrouped into one cluster per component.
/// Returns the ids of the new ducks.
pub fn connect_ducklings(board: &mut Board, ducks: &[PieceId]) -> Vec<PieceId> {
    let mut targets: Vec<PieceId> = Vec::new();
    let mut seen = HashSet::new();

    for &duck in ducks {
        if !board.piece(duck).is_some_and(|p| p.kind() == PieceType::Duck) {
            continue;
        }
        for duckling in board.get_bordering_pieces(duck, PieceType::Duckling) {
            let members = match board.cluster_of(duckling) {
                Some(cluster) => cluster.pieces().to_vec(),
                None => vec![duckling],
            };
            for m in members {
                if seen.insert(m) {
                    targets.push(m);
                }
            }
        }
    }

    if targets.is_empty() {
        return Vec::new();
    }

    let mut created = Vec::with_capacity(targets.len());
    for duckling in targets {
        let Some(old) = board.discard_piece(duckling) else {
            continue;
        };
        if let Some(id) = board.create_piece(PieceType::Duck, old.x(), old.y()) {
            created.push(id);
        }
    }

    let mut seeds: Vec<PieceId> = ducks.to_vec();
    seeds.extend(created.iter().copied());
    regroup(board, &seeds);

    debug!(absorbed = created.len(), "ducklings joined the ducks");
    created
}

/// Verify that the clusters of `kind` are exactly its connected components
pub fn check_partition(board: &Board, kind: PieceType) -> Result<(), ClusterInvariantError> {
    for cluster in board.clusters().filter(|c| c.kind() == kind) {
        if cluster.is_empty() {
            return Err(ClusterInvariantError::Empty(cluster.id()));
        }
        for &member in cluster.pieces() {
            let valid = board
                .piece(member)
                .is_some_and(|p| p.kind() == kind && p.cluster() == Some(cluster.id()));
            if !valid {
                return Err(ClusterInvariantError::StaleMember {
                    cluster: cluster.id(),
                    piece: member,
                });
            }
        }
    }

    for &id in board.pieces_of(kind) {
        let Some(cid) = board.piece(id).and_then(|p| p.cluster()) else {
            return Err(ClusterInvariantError::Unclustered(id));
        };
        let Some(cluster) = board.cluster(cid) else {
            return Err(ClusterInvariantError::MissingCluster { piece: id, cluster: cid });
        };
        let component: HashSet<PieceId> = group(board, id).into_iter().collect();
        let exact = component.len() == cluster.len()
            && cluster.pieces().iter().all(|m| component.contains(m));
        if !exact {
            return Err(ClusterInvariantError::NotComponent { cluster: cid, piece: id });
        }
    }
    Ok(())
}
