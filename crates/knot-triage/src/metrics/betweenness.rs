//! Betweenness centrality via Brandes' algorithm.
//!
//! # Overview
//!
//! Betweenness centrality measures how often an issue lies on shortest
//! paths between other pairs of issues. High-betweenness issues are
//! bottlenecks: work elsewhere funnels through them.
//!
//! # Algorithm
//!
//! Brandes (2001) for unweighted directed graphs:
//!
//! 1. For each source node `s`, run BFS to compute shortest-path counts
//!    and distances.
//! 2. Accumulate dependency scores in reverse BFS order (farthest nodes first).
//! 3. Sum the dependency scores across all source nodes.
//!
//! Complexity: O(V * E).
//!
//! # Output
//!
//! Scores are **not** normalized. Callers that need a unit range can divide
//! by `(n-1)*(n-2)` or use [`crate::score::normalize_metric`].

use std::collections::{HashMap, VecDeque};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::{IntoNodeIdentifiers, NodeIndexable},
};
use tracing::instrument;

use crate::metrics::scores_by_id;

/// Compute betweenness centrality for every issue in `g`.
///
/// Disconnected nodes and nodes with no shortest paths through them
/// receive 0.0.
#[must_use]
#[instrument(skip(g), fields(nodes = g.node_count()))]
pub fn betweenness_centrality(g: &DiGraph<String, ()>) -> HashMap<String, f64> {
    let n = g.node_count();

    if n == 0 {
        return HashMap::new();
    }

    let mut cb: Vec<f64> = vec![0.0; n];

    // Scratch buffers reused across sources.
    let mut stack: Vec<NodeIndex> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
    let mut sigma: Vec<f64> = vec![0.0; n];
    let mut dist: Vec<i64> = vec![-1; n];
    let mut delta: Vec<f64> = vec![0.0; n];
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();

    for s in g.node_identifiers() {
        let si = g.to_index(s);

        stack.clear();
        for p in &mut predecessors {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[si] = 1.0;
        dist[si] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            let vi = g.to_index(v);
            stack.push(v);

            for w in g.neighbors_directed(v, Direction::Outgoing) {
                let wi = g.to_index(w);

                // First visit to w?
                if dist[wi] < 0 {
                    dist[wi] = dist[vi] + 1;
                    queue.push_back(w);
                }

                // Shortest path to w via v?
                if dist[wi] == dist[vi] + 1 {
                    sigma[wi] += sigma[vi];
                    predecessors[wi].push(v);
                }
            }
        }

        // Accumulate dependencies in reverse BFS order.
        while let Some(w) = stack.pop() {
            let wi = g.to_index(w);

            for &v in &predecessors[wi] {
                let vi = g.to_index(v);
                if sigma[wi] > 0.0 {
                    delta[vi] += (sigma[vi] / sigma[wi]) * (1.0 + delta[wi]);
                }
            }

            if wi != si {
                cb[wi] += delta[wi];
            }
        }
    }

    scores_by_id(g, &cb)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
