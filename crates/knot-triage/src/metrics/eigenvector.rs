//! Eigenvector centrality via power iteration.
//!
//! # Overview
//!
//! Eigenvector centrality scores an issue by the scores of the issues it
//! is connected to: a link to a central issue counts for more than a link
//! to a peripheral one.
//!
//! # Algorithm
//!
//! Dependency graphs are mostly DAGs, where directed power iteration
//! converges to zero. We therefore iterate on the **undirected** adjacency
//! (an edge contributes to both endpoints), shifted by the identity:
//!
//! ```text
//! x'(v) = x(v) + Σ x(u)   for each neighbour u of v
//! ```
//!
//! The shift keeps bipartite structures (stars, chains) from oscillating
//! without changing the dominant eigenvector. After each step the vector
//! is scaled so its largest component is 1. An all-zero or non-finite
//! result falls back to uniform 1.0.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::{IntoNodeIdentifiers, NodeIndexable},
};
use tracing::{debug, instrument};

use crate::metrics::scores_by_id;

/// Result of eigenvector centrality computation.
#[derive(Debug, Clone)]
pub struct EigenvectorResult {
    /// Eigenvector centrality scores: issue ID → score in `0..=1`.
    pub scores: HashMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`.
    pub converged: bool,
}

/// Compute eigenvector centrality for every issue in `g`.
///
/// Stops when the max-norm of the change drops below `tolerance`, or
/// after `max_iter` iterations.
#[must_use]
#[instrument(skip(g), fields(nodes = g.node_count()))]
pub fn eigenvector_centrality(
    g: &DiGraph<String, ()>,
    max_iter: usize,
    tolerance: f64,
) -> EigenvectorResult {
    let n = g.node_count();

    if n == 0 {
        return EigenvectorResult {
            scores: HashMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    // Undirected neighbours: incoming ∪ outgoing.
    let neighbors: Vec<Vec<usize>> = g
        .node_identifiers()
        .map(|v| {
            let mut nbrs: Vec<NodeIndex> = g.neighbors_directed(v, Direction::Incoming).collect();
            for w in g.neighbors_directed(v, Direction::Outgoing) {
                if !nbrs.contains(&w) {
                    nbrs.push(w);
                }
            }
            nbrs.into_iter().map(|u| g.to_index(u)).collect()
        })
        .collect();

    let mut scores: Vec<f64> = vec![1.0; n];
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..max_iter {
        iterations = iter + 1;

        let mut next: Vec<f64> = scores.clone();
        for (vi, nbrs) in neighbors.iter().enumerate() {
            for &ui in nbrs {
                next[vi] += scores[ui];
            }
        }

        if !normalize_max(&mut next) {
            break;
        }

        let diff = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);

        scores = next;

        if diff < tolerance {
            converged = true;
            break;
        }
    }

    if !scores.iter().all(|x| x.is_finite()) || scores.iter().all(|x| *x <= 0.0) {
        scores.fill(1.0);
    }

    debug!(iterations, converged, "eigenvector finished");

    EigenvectorResult {
        scores: scores_by_id(g, &scores),
        iterations,
        converged,
    }
}

/// Scale so the largest component is 1. Returns `false` when the vector
/// has no positive finite maximum.
fn normalize_max(v: &mut [f64]) -> bool {
    let max = v.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 || !max.is_finite() {
        return false;
    }
    for x in v.iter_mut() {
        *x /= max;
    }
    true
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
        let result = eigenvector_centrality(&DiGraph::new(), 100, 1e-6);
        assert!(result.scores.is_empty());
    }

    #[test]
    fn isolated_nodes_are_uniform() {
        let result = eigenvector_centrality(&make_graph(&["A", "B"], &[]), 100, 1e-6);
        assert!((result.scores["A"] - 1.0).abs() < 1e-9);
        assert!((result.scores["B"] - 1.0).abs() < 1e-9);
        assert!(result.converged);
    }

    #[test]
    fn star_center_is_most_central() {
        let result = eigenvector_centrality(
            &make_graph(&["A", "B", "C", "D"], &[("A", "C"), ("B", "C"), ("D", "C")]),
            100,
            1e-6,
        );
        assert!((result.scores["C"] - 1.0).abs() < 1e-9);
        for id in ["A", "B", "D"] {
            assert!(result.scores[id] < 1.0, "{id}");
            assert!(result.scores[id] > 0.0, "{id}");
        }
        assert!(result.converged, "shifted iteration should not oscillate");
    }

    #[test]
    fn chain_middle_beats_ends() {
        let result = eigenvector_centrality(
            &make_graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]),
            100,
            1e-6,
        );
        assert!(result.scores["B"] > result.scores["A"]);
        assert!((result.scores["A"] - result.scores["C"]).abs() < 1e-9);
    }

    #[test]
    fn max_component_is_one() {
        let result = eigenvector_centrality(
            &make_graph(
                &["A", "B", "C", "D", "E"],
                &[("A", "B"), ("B", "C"), ("C", "A"), ("D", "A"), ("E", "D")],
            ),
            100,
            1e-6,
        );
        let max = result.scores.values().copied().fold(0.0_f64, f64::max);
        assert!((max - 1.0).abs() < 1e-9);
    }
}
