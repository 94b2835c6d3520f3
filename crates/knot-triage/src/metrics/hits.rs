//! HITS (Hyperlink-Induced Topic Search) algorithm.
//!
//! # Overview
//!
//! HITS computes two scores for each issue:
//!
//! - **Hub score**: an issue that depends on many authoritative issues.
//! - **Authority score**: an issue that many good hubs depend on.
//!
//! # Algorithm
//!
//! Iterative power method (Kleinberg, 1999):
//!
//! 1. Initialize all hub and authority scores to 1.0.
//! 2. Authority update: `auth(v) = sum of hub(u) for all u → v`.
//! 3. Hub update: `hub(v) = sum of auth(w) for all v → w`.
//! 4. Normalize both vectors to unit length (L2 norm).
//! 5. Repeat until convergence or max iterations.
//!
//! A vector whose norm is zero stays zero, so isolated issues score 0.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::DiGraph,
    visit::{IntoNodeIdentifiers, NodeIndexable},
};
use tracing::{debug, instrument};

use crate::metrics::scores_by_id;

/// Result of the HITS algorithm.
#[derive(Debug, Clone)]
pub struct HitsResult {
    /// Hub scores: issue ID → hub score.
    pub hubs: HashMap<String, f64>,
    /// Authority scores: issue ID → authority score.
    pub authorities: HashMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`.
    pub converged: bool,
}

/// Compute HITS hub and authority scores.
///
/// Stops when both the authority and hub vectors move less than
/// `tolerance` (L2) in one iteration, or after `max_iter` iterations.
#[must_use]
#[instrument(skip(g), fields(nodes = g.node_count()))]
pub fn hits(g: &DiGraph<String, ()>, max_iter: usize, tolerance: f64) -> HitsResult {
    let n = g.node_count();

    if n == 0 {
        return HitsResult {
            hubs: HashMap::new(),
            authorities: HashMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    let mut hub: Vec<f64> = vec![1.0; n];
    let mut auth: Vec<f64> = vec![1.0; n];

    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..max_iter {
        iterations = iter + 1;

        // Authority update: auth(v) = sum of hub(u) for all u → v
        let mut new_auth = vec![0.0; n];
        for v in g.node_identifiers() {
            let vi = g.to_index(v);
            for u in g.neighbors_directed(v, Direction::Incoming) {
                new_auth[vi] += hub[g.to_index(u)];
            }
        }

        // Hub update: hub(v) = sum of auth(w) for all v → w
        let mut new_hub = vec![0.0; n];
        for v in g.node_identifiers() {
            let vi = g.to_index(v);
            for w in g.neighbors_directed(v, Direction::Outgoing) {
                new_hub[vi] += new_auth[g.to_index(w)];
            }
        }

        normalize_l2(&mut new_auth);
        normalize_l2(&mut new_hub);

        let diff = l2_distance(&auth, &new_auth).max(l2_distance(&hub, &new_hub));

        auth = new_auth;
        hub = new_hub;

        if diff < tolerance {
            converged = true;
            break;
        }
    }

    debug!(iterations, converged, "hits finished");

    HitsResult {
        hubs: scores_by_id(g, &hub),
        authorities: scores_by_id(g, &auth),
        iterations,
        converged,
    }
}

/// Normalize a vector to unit L2 norm. If the norm is zero, leave as-is.
fn normalize_l2(v: &mut [f64]) {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::make_graph;

    #[test]
    fn empty_graph_returns_empty() {
        let result = hits(&DiGraph::new(), 100, 1e-6);
        assert!(result.hubs.is_empty());
        assert!(result.authorities.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn isolated_node_scores_zero() {
        let result = hits(&make_graph(&["A", "B", "C"], &[("A", "B")]), 100, 1e-6);
        assert!(result.hubs["C"].abs() < f64::EPSILON);
        assert!(result.authorities["C"].abs() < f64::EPSILON);
    }

    #[test]
    fn simple_edge_hub_and_authority() {
        // A depends on B: A is the hub, B the authority.
        let result = hits(&make_graph(&["A", "B"], &[("A", "B")]), 100, 1e-6);
        assert!(result.hubs["A"] > result.hubs["B"]);
        assert!(result.authorities["B"] > result.authorities["A"]);
    }

    #[test]
    fn star_authority_topology() {
        // Everyone depends on C.
        let result = hits(
            &make_graph(&["A", "B", "C", "D"], &[("A", "C"), ("B", "C"), ("D", "C")]),
            100,
            1e-6,
        );
        assert!((result.authorities["C"] - 1.0).abs() < 1e-9);
        for id in ["A", "B", "D"] {
            assert!(result.authorities[id].abs() < 1e-9, "{id}");
            assert!(result.hubs[id] > result.hubs["C"], "{id}");
        }
    }

    #[test]
    fn star_hub_topology() {
        // A depends on everyone.
        let result = hits(
            &make_graph(&["A", "B", "C", "D"], &[("A", "B"), ("A", "C"), ("A", "D")]),
            100,
            1e-6,
        );
        assert!((result.hubs["A"] - 1.0).abs() < 1e-9);
        for id in ["B", "C", "D"] {
            assert!(result.authorities[id] > result.authorities["A"], "{id}");
        }
    }

    #[test]
    fn vectors_are_unit_length() {
        let result = hits(
            &make_graph(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("A", "C"), ("D", "C")]),
            100,
            1e-6,
        );
        let norm = |m: &HashMap<String, f64>| m.values().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm(&result.hubs) - 1.0).abs() < 1e-9);
        assert!((norm(&result.authorities) - 1.0).abs() < 1e-9);
        assert!(result.converged);
    }

    #[test]
    fn iteration_cap_is_respected() {
        let result = hits(&make_graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]), 2, 0.0);
        assert_eq!(result.iterations, 2);
        assert!(!result.converged);
    }
}
