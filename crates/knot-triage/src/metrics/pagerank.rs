//! PageRank over the dependency graph.
//!
//! # Overview
//!
//! Edges point from a dependent to what it depends on, so rank collects on
//! the foundational issues that the most work flows into.
//!
//! # Algorithm
//!
//! Standard power iteration:
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) / out_degree(u)   for each u → v
//!                     + d * Σ PR(w) / N                for each dangling w
//! ```
//!
//! where `d` is the damping factor (default 0.85). Iteration starts from
//! the uniform vector `1/N` and stops when the L1 norm of the change drops
//! below `tolerance` or after `max_iter` rounds. The final vector is
//! renormalized so the scores sum to exactly 1.

use std::collections::HashMap;

use knot_core::config::AnalysisConfig;
use petgraph::{
    Direction,
    graph::DiGraph,
    visit::{IntoNodeIdentifiers, NodeIndexable},
};
use tracing::{debug, instrument};

use crate::metrics::scores_by_id;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (probability of following a link vs teleporting).
    /// Default: 0.85.
    pub damping: f64,
    /// Convergence threshold: stop when L1 norm of rank delta < tolerance.
    /// Default: 1e-6.
    pub tolerance: f64,
    /// Maximum number of iterations.
    /// Default: 100.
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

impl From<&AnalysisConfig> for PageRankConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            damping: config.damping,
            tolerance: config.tolerance,
            max_iter: config.max_iter,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Result of a PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// PageRank scores: issue ID → score.
    pub scores: HashMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`.
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// PageRank
// ---------------------------------------------------------------------------

/// Compute PageRank on `g`.
///
/// An empty graph yields an empty score map. When iteration hits
/// `max_iter` the best-effort vector at cutoff is returned.
#[must_use]
#[instrument(skip(g, config), fields(nodes = g.node_count()))]
pub fn pagerank(g: &DiGraph<String, ()>, config: &PageRankConfig) -> PageRankResult {
    let n = g.node_count();

    if n == 0 {
        return PageRankResult {
            scores: HashMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let out_degree: Vec<usize> = g
        .node_identifiers()
        .map(|node| g.neighbors_directed(node, Direction::Outgoing).count())
        .collect();

    // Initialize ranks uniformly.
    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iter {
        iterations += 1;

        // Dangling mass is spread over every node.
        let dangling: f64 = (0..n).filter(|&i| out_degree[i] == 0).map(|i| ranks[i]).sum();
        let teleport = base + config.damping * dangling / n_f64;

        for r in &mut new_ranks {
            *r = teleport;
        }

        for node in g.node_identifiers() {
            let idx = g.to_index(node);
            if out_degree[idx] == 0 {
                continue;
            }
            let share = config.damping * ranks[idx] / out_degree[idx] as f64;
            for neighbor in g.neighbors_directed(node, Direction::Outgoing) {
                new_ranks[g.to_index(neighbor)] += share;
            }
        }

        // Check convergence: L1 norm of delta.
        let delta: f64 = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    let total: f64 = ranks.iter().sum();
    if total > 0.0 && total.is_finite() {
        for r in &mut ranks {
            *r /= total;
        }
    } else {
        ranks.fill(1.0 / n_f64);
    }

    debug!(iterations, converged, "pagerank finished");

    PageRankResult {
        scores: scores_by_id(g, &ranks),
        iterations,
        converged,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::make_graph;

    fn sum(result: &PageRankResult) -> f64 {
        result.scores.values().sum()
    }

    #[test]
    fn empty_graph_returns_empty() {
        let result = pagerank(&DiGraph::new(), &PageRankConfig::default());
        assert!(result.scores.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn isolated_nodes_are_uniform() {
        let g = make_graph(&["A", "B", "C", "D"], &[]);
        let result = pagerank(&g, &PageRankConfig::default());
        for id in ["A", "B", "C", "D"] {
            assert!((result.scores[id] - 0.25).abs() < 1e-9, "{id}");
        }
        assert!(result.converged);
    }

    #[test]
    fn dependency_collects_rank() {
        // B and C depend on A.
        let g = make_graph(&["A", "B", "C"], &[("B", "A"), ("C", "A")]);
        let result = pagerank(&g, &PageRankConfig::default());
        assert!(result.scores["A"] > result.scores["B"]);
        assert!((result.scores["B"] - result.scores["C"]).abs() < 1e-12);
        assert!((sum(&result) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn chain_orders_rank_toward_root() {
        // C depends on B depends on A.
        let g = make_graph(&["A", "B", "C"], &[("C", "B"), ("B", "A")]);
        let result = pagerank(&g, &PageRankConfig::default());
        assert!(result.scores["A"] > result.scores["B"]);
        assert!(result.scores["B"] > result.scores["C"]);
    }

    #[test]
    fn cycle_with_tail_sums_to_one() {
        let g = make_graph(&["A", "B", "C"], &[("A", "B"), ("B", "A"), ("C", "A")]);
        let result = pagerank(&g, &PageRankConfig::default());
        assert!((sum(&result) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_cap_returns_best_effort() {
        let g = make_graph(&["A", "B", "C"], &[("C", "B"), ("B", "A")]);
        let config = PageRankConfig {
            max_iter: 1,
            tolerance: 0.0,
            ..PageRankConfig::default()
        };
        let result = pagerank(&g, &config);
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert!((sum(&result) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn config_conversion_copies_fields() {
        let analysis = AnalysisConfig {
            damping: 0.5,
            max_iter: 7,
            ..AnalysisConfig::default()
        };
        let config = PageRankConfig::from(&analysis);
        assert!((config.damping - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.max_iter, 7);
    }
}
