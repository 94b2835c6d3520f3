//! Fast-path structural statistics.
//!
//! Everything here is a single O(V+E) sweep over [`RawGraph`]; no
//! iterative algorithms. Phase 1 is computed on the calling thread and is
//! visible as soon as a [`GraphStats`](crate::analysis::GraphStats) exists.

use std::collections::{HashMap, HashSet};

use knot_core::model::Status;
use petgraph::{
    Direction,
    algo::{connected_components, toposort},
    visit::{IntoNodeIdentifiers, NodeIndexable},
};
use tracing::{debug, instrument};

use crate::graph::RawGraph;

/// Structural statistics available immediately after graph construction.
#[derive(Debug, Clone, Default)]
pub struct Phase1Stats {
    /// Number of issues (nodes).
    pub node_count: usize,
    /// Number of validated dependency edges, all kinds.
    pub edge_count: usize,
    /// `edges / (nodes * (nodes - 1))`, 0 for fewer than two nodes.
    pub density: f64,
    /// Issues with status `open`.
    pub open_count: usize,
    /// Issues with status `in_progress`.
    pub in_progress_count: usize,
    /// Issues with status `blocked`.
    pub blocked_status_count: usize,
    /// Issues with status `closed`.
    pub closed_count: usize,
    /// Issues with no edges in either direction.
    pub isolated_count: usize,
    /// Weakly connected components over all edge kinds.
    pub weakly_connected_components: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    /// Dependency entries dropped for referencing unknown issues.
    pub dropped_edges: usize,
    /// Number of dependents per issue (incoming edges, all kinds).
    pub in_degree: HashMap<String, usize>,
    /// Number of dependencies per issue (outgoing edges, all kinds).
    pub out_degree: HashMap<String, usize>,
    /// Non-closed `blocks` targets per non-closed issue, sorted. Only issues
    /// with at least one open blocker appear.
    pub open_blockers: HashMap<String, Vec<String>>,
    /// Non-closed issues that `blocks`-depend on each issue, sorted.
    pub dependents: HashMap<String, Vec<String>>,
    /// Non-closed issues with no open blocker and a status other than
    /// `blocked`, sorted by ID.
    pub actionable: Vec<String>,
    /// Topological order of the blocking subgraph, blockers first. `None`
    /// when a blocking cycle exists.
    pub topological_order: Option<Vec<String>>,
    status: HashMap<String, Status>,
}

impl Phase1Stats {
    /// Compute Phase 1 statistics from `raw`.
    #[must_use]
    #[instrument(skip(raw), fields(nodes = raw.node_count(), edges = raw.edge_count()))]
    pub fn compute(raw: &RawGraph) -> Self {
        let g = &raw.graph;
        let node_count = raw.node_count();
        let edge_count = raw.edge_count();

        let mut stats = Self {
            node_count,
            edge_count,
            density: compute_density(node_count, edge_count),
            weakly_connected_components: connected_components(g),
            dropped_edges: raw.dropped_edges,
            ..Self::default()
        };

        for node in g.node_identifiers() {
            let id = &g[node];
            let status = raw.status[g.to_index(node)];
            stats.status.insert(id.clone(), status);

            match status {
                Status::Open => stats.open_count += 1,
                Status::InProgress => stats.in_progress_count += 1,
                Status::Blocked => stats.blocked_status_count += 1,
                Status::Closed => stats.closed_count += 1,
            }

            let in_deg = g.neighbors_directed(node, Direction::Incoming).count();
            let out_deg = g.neighbors_directed(node, Direction::Outgoing).count();
            if in_deg == 0 && out_deg == 0 {
                stats.isolated_count += 1;
            }
            stats.max_in_degree = stats.max_in_degree.max(in_deg);
            stats.max_out_degree = stats.max_out_degree.max(out_deg);
            stats.in_degree.insert(id.clone(), in_deg);
            stats.out_degree.insert(id.clone(), out_deg);
        }

        // Blocking relations between non-closed issues. Self-loops never
        // count as an open blocker.
        let blocking = &raw.blocking;
        for node in blocking.node_identifiers() {
            if raw.status[blocking.to_index(node)].is_closed() {
                continue;
            }
            let mut blockers: Vec<String> = blocking
                .neighbors_directed(node, Direction::Outgoing)
                .filter(|&b| b != node && !raw.status[blocking.to_index(b)].is_closed())
                .map(|b| blocking[b].clone())
                .collect();
            if blockers.is_empty() {
                continue;
            }
            blockers.sort_unstable();
            for blocker in &blockers {
                stats
                    .dependents
                    .entry(blocker.clone())
                    .or_default()
                    .push(blocking[node].clone());
            }
            stats.open_blockers.insert(blocking[node].clone(), blockers);
        }
        for list in stats.dependents.values_mut() {
            list.sort_unstable();
        }

        stats.actionable = raw
            .ids()
            .filter(|id| {
                matches!(stats.status.get(*id), Some(Status::Open | Status::InProgress))
                    && !stats.open_blockers.contains_key(*id)
            })
            .map(str::to_string)
            .collect();

        // petgraph orders dependents before their blockers; reverse it.
        stats.topological_order = toposort(blocking, None).ok().map(|order| {
            order
                .into_iter()
                .rev()
                .map(|idx| blocking[idx].clone())
                .collect()
        });

        debug!(
            actionable = stats.actionable.len(),
            blocked = stats.open_blockers.len(),
            "phase 1 computed"
        );
        stats
    }

    /// `true` when `id` is non-closed and has at least one open blocker.
    #[must_use]
    pub fn is_blocked(&self, id: &str) -> bool {
        self.open_blockers.contains_key(id)
    }

    /// Open blockers of `id`, sorted. Empty when unblocked or unknown.
    #[must_use]
    pub fn open_blockers(&self, id: &str) -> &[String] {
        self.open_blockers.get(id).map_or(&[], Vec::as_slice)
    }

    /// Non-closed issues directly blocked by `id`.
    #[must_use]
    pub fn dependents(&self, id: &str) -> &[String] {
        self.dependents.get(id).map_or(&[], Vec::as_slice)
    }

    /// Issues that become free of open blockers if `id` closes: non-closed
    /// dependents whose only open blocker is `id`.
    #[must_use]
    pub fn unblocks(&self, id: &str) -> Vec<String> {
        self.dependents(id)
            .iter()
            .filter(|dep| self.open_blockers(dep) == [id])
            .cloned()
            .collect()
    }

    /// Actionable issue IDs in sorted order.
    #[must_use]
    pub fn actionable_ids(&self) -> &[String] {
        &self.actionable
    }

    #[must_use]
    pub fn is_actionable(&self, id: &str) -> bool {
        self.actionable.binary_search_by(|a| a.as_str().cmp(id)).is_ok()
    }

    /// Number of issues that are blocked, either by status or by an open
    /// blocker.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        let by_status: HashSet<&str> = self
            .status
            .iter()
            .filter(|(_, s)| **s == Status::Blocked)
            .map(|(id, _)| id.as_str())
            .collect();
        by_status.len()
            + self
                .open_blockers
                .keys()
                .filter(|id| !by_status.contains(id.as_str()))
                .count()
    }

    /// Status of `id`, if known.
    #[must_use]
    pub fn status(&self, id: &str) -> Option<Status> {
        self.status.get(id).copied()
    }

    #[must_use]
    pub fn has_blocking_cycle(&self) -> bool {
        self.topological_order.is_none()
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0_f64;
    }
    let max_edges = (node_count * (node_count - 1)) as f64;
    edge_count as f64 / max_edges
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
