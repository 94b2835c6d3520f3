//! Critical path heights over the blocking graph.
//!
//! # Overview
//!
//! The *height* of an issue is the length of the longest chain of `blocks`
//! edges hanging below it: how many sequential steps of downstream work
//! are waiting on it, directly or transitively.
//!
//! | Situation                           | Height |
//! |-------------------------------------|--------|
//! | nothing depends on the issue        | 0      |
//! | otherwise                           | 1 + max(height of each dependent) |
//! | in a cycle, or below one            | unreliable |
//!
//! # Algorithm
//!
//! 1. Detect cycles ([`crate::graph::cycles::detect_cycles`]).
//! 2. Mark every node reachable from a cycle member (following
//!    `dependent → blocker` edges) as unreliable: its chain length is
//!    unbounded.
//! 3. Kahn-style pass over the remaining nodes, dependents first,
//!    propagating `height + 1` to each blocker.
//! 4. Reconstruct one longest chain from the tallest reliable node,
//!    always stepping to the dependent one level lower (ties by ID).

use std::collections::{HashMap, VecDeque};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::{IntoNodeIdentifiers, NodeIndexable},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::graph::cycles::CycleReport;

/// Score reported for issues whose height cannot be trusted.
pub const UNRELIABLE_HEIGHT: f64 = -1.0;

/// Height of a single issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Height {
    Reliable(usize),
    /// In, or downstream-reachable from, a blocking cycle.
    Unreliable,
}

impl Height {
    /// Numeric form used by score accessors ([`UNRELIABLE_HEIGHT`] sentinel).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_score(self) -> f64 {
        match self {
            Self::Reliable(h) => h as f64,
            Self::Unreliable => UNRELIABLE_HEIGHT,
        }
    }

    #[must_use]
    pub const fn reliable(self) -> Option<usize> {
        match self {
            Self::Reliable(h) => Some(h),
            Self::Unreliable => None,
        }
    }
}

/// Result of height analysis on the blocking graph.
#[derive(Debug, Clone, Default)]
pub struct CriticalPathResult {
    /// Per-issue height.
    pub heights: HashMap<String, Height>,
    /// One longest chain, top blocker first. Never contains cycle members.
    pub critical_path: Vec<String>,
    /// Height of the tallest reliable issue.
    pub max_height: usize,
    /// `true` when at least one blocking cycle exists.
    pub has_cycle: bool,
}

impl CriticalPathResult {
    #[must_use]
    pub fn height(&self, issue_id: &str) -> Option<Height> {
        self.heights.get(issue_id).copied()
    }

    /// Number of issues whose height could not be computed.
    #[must_use]
    pub fn unreliable_count(&self) -> usize {
        self.heights
            .values()
            .filter(|h| matches!(h, Height::Unreliable))
            .count()
    }
}

/// Compute heights for every node of `blocking` (edges `dependent → blocker`).
///
/// `cycles` must come from [`crate::graph::cycles::detect_cycles`] on the
/// same graph.
#[must_use]
#[instrument(skip(blocking, cycles), fields(nodes = blocking.node_count()))]
pub fn compute_heights(blocking: &DiGraph<String, ()>, cycles: &CycleReport) -> CriticalPathResult {
    let n = blocking.node_count();
    if n == 0 {
        return CriticalPathResult::default();
    }

    // --- Unreliable set: cycle members and everything they reach ---
    let mut unreliable = vec![false; n];
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    for node in blocking.node_identifiers() {
        if cycles.is_on_cycle(node) {
            unreliable[blocking.to_index(node)] = true;
            queue.push_back(node);
        }
    }
    while let Some(v) = queue.pop_front() {
        for w in blocking.neighbors_directed(v, Direction::Outgoing) {
            let wi = blocking.to_index(w);
            if !unreliable[wi] {
                unreliable[wi] = true;
                queue.push_back(w);
            }
        }
    }

    // --- Kahn pass over reliable nodes, dependents first ---
    // Every dependent of a reliable node is itself reliable, so in-degrees
    // only count reliable sources.
    let mut pending: Vec<usize> = blocking
        .node_identifiers()
        .map(|v| blocking.neighbors_directed(v, Direction::Incoming).count())
        .collect();
    let mut height = vec![0_usize; n];
    let mut ready: VecDeque<NodeIndex> = blocking
        .node_identifiers()
        .filter(|&v| !unreliable[blocking.to_index(v)] && pending[blocking.to_index(v)] == 0)
        .collect();

    while let Some(v) = ready.pop_front() {
        let vi = blocking.to_index(v);
        for w in blocking.neighbors_directed(v, Direction::Outgoing) {
            let wi = blocking.to_index(w);
            if unreliable[wi] {
                continue;
            }
            height[wi] = height[wi].max(height[vi] + 1);
            pending[wi] -= 1;
            if pending[wi] == 0 {
                ready.push_back(w);
            }
        }
    }

    let mut heights = HashMap::with_capacity(n);
    let mut max_height = 0;
    let mut top: Option<NodeIndex> = None;

    for v in blocking.node_identifiers() {
        let vi = blocking.to_index(v);
        let Some(id) = blocking.node_weight(v) else {
            continue;
        };
        if unreliable[vi] {
            heights.insert(id.clone(), Height::Unreliable);
            continue;
        }
        heights.insert(id.clone(), Height::Reliable(height[vi]));

        // Node order is sorted by ID, so strict `>` keeps the smallest ID.
        if top.is_none() || height[vi] > max_height {
            max_height = height[vi];
            top = Some(v);
        }
    }

    let critical_path = top
        .map(|start| reconstruct_chain(blocking, start, &height, &unreliable))
        .unwrap_or_default();

    CriticalPathResult {
        heights,
        critical_path,
        max_height,
        has_cycle: cycles.has_cycle(),
    }
}

/// Walk from `start` down through dependents, one level at a time.
fn reconstruct_chain(
    blocking: &DiGraph<String, ()>,
    start: NodeIndex,
    height: &[usize],
    unreliable: &[bool],
) -> Vec<String> {
    let mut chain = Vec::with_capacity(height[start.index()] + 1);
    let mut current = start;

    loop {
        if let Some(id) = blocking.node_weight(current) {
            chain.push(id.clone());
        }
        let h = height[current.index()];
        if h == 0 {
            break;
        }
        let next = blocking
            .neighbors_directed(current, Direction::Incoming)
            .filter(|d| !unreliable[d.index()] && height[d.index()] + 1 == h)
            .min_by(|a, b| blocking[*a].cmp(&blocking[*b]));
        match next {
            Some(d) => current = d,
            None => break,
        }
    }

    chain
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::cycles::detect_cycles;

    /// Build a blocking graph from `(blocker, blocked)` pairs.
    fn blocks(nodes: &[&str], pairs: &[(&str, &str)]) -> DiGraph<String, ()> {
        let mut g = DiGraph::<String, ()>::new();
        let idx: Vec<NodeIndex> = nodes.iter().map(|n| g.add_node((*n).to_string())).collect();
        let find = |id: &str| idx[nodes.iter().position(|n| *n == id).expect("known node")];
        for (blocker, blocked) in pairs {
            g.add_edge(find(blocked), find(blocker), ());
        }
        g
    }

    fn run(g: &DiGraph<String, ()>) -> CriticalPathResult {
        compute_heights(g, &detect_cycles(g))
    }

    #[test]
    fn empty_graph_returns_empty_result() {
        let result = run(&DiGraph::new());
        assert!(result.heights.is_empty());
        assert!(result.critical_path.is_empty());
        assert!(!result.has_cycle);
    }

    #[test]
    fn single_node_height_zero() {
        let result = run(&blocks(&["A"], &[]));
        assert_eq!(result.height("A"), Some(Height::Reliable(0)));
        assert_eq!(result.critical_path, vec!["A".to_string()]);
    }

    #[test]
    fn chain_heights_count_downstream_steps() {
        // A blocks B blocks C
        let result = run(&blocks(&["A", "B", "C"], &[("A", "B"), ("B", "C")]));
        assert_eq!(result.height("A"), Some(Height::Reliable(2)));
        assert_eq!(result.height("B"), Some(Height::Reliable(1)));
        assert_eq!(result.height("C"), Some(Height::Reliable(0)));
        assert!(!result.has_cycle);
        assert_eq!(result.max_height, 2);
        assert_eq!(
            result.critical_path,
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn diamond_takes_longest_branch() {
        // A blocks B and E; B blocks C; C and E block D
        let result = run(&blocks(
            &["A", "B", "C", "D", "E"],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("A", "E"), ("E", "D")],
        ));
        assert_eq!(result.height("A"), Some(Height::Reliable(3)));
        assert_eq!(result.height("E"), Some(Height::Reliable(1)));
        assert_eq!(result.critical_path.len(), 4);
    }

    #[test]
    fn cycle_members_are_unreliable() {
        let result = run(&blocks(&["A", "B"], &[("A", "B"), ("B", "A")]));
        assert!(result.has_cycle);
        assert_eq!(result.height("A"), Some(Height::Unreliable));
        assert_eq!(result.height("B"), Some(Height::Unreliable));
        assert!(result.critical_path.is_empty());
        assert!((Height::Unreliable.as_score() - UNRELIABLE_HEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn blockers_of_a_cycle_are_unreliable_dependents_are_not() {
        // X blocks A; A <-> B; B blocks Z
        // X sits above the cycle (unbounded chain below it).
        // Z only waits on the cycle; nothing depends on Z.
        let result = run(&blocks(
            &["A", "B", "X", "Z"],
            &[("X", "A"), ("A", "B"), ("B", "A"), ("B", "Z")],
        ));
        assert_eq!(result.height("X"), Some(Height::Unreliable));
        assert_eq!(result.height("Z"), Some(Height::Reliable(0)));
        assert_eq!(result.unreliable_count(), 3);
        assert_eq!(result.critical_path, vec!["Z".to_string()]);
    }

    #[test]
    fn self_loop_is_unreliable() {
        let result = run(&blocks(&["A", "B"], &[("A", "A"), ("A", "B")]));
        assert_eq!(result.height("A"), Some(Height::Unreliable));
        assert_eq!(result.height("B"), Some(Height::Reliable(0)));
    }
}
