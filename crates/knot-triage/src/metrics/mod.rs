//! Centrality metrics for the dependency graph.
//!
//! # Overview
//!
//! Each metric answers a different question about issue importance:
//!
//! - **PageRank** (`pagerank`): Which issues does the most work ultimately
//!   flow into?
//! - **Betweenness centrality** (`betweenness`): Which issues act as
//!   bridges or bottlenecks?
//! - **HITS** (`hits`): Which issues are authoritative (many things depend
//!   on them) vs hubs (they depend on many things)?
//! - **Eigenvector centrality** (`eigenvector`): Which issues are connected
//!   to other high-centrality issues?
//!
//! # Usage
//!
//! All metrics take the simple centrality graph from
//! [`RawGraph::centrality`](crate::graph::RawGraph) (edges
//! `dependent → dependency`, no parallel edges, no self-loops) and return
//! scores keyed by issue ID.
//!
//! ```rust,ignore
//! use knot_triage::graph::RawGraph;
//! use knot_triage::metrics::{betweenness::betweenness_centrality, hits::hits};
//!
//! let raw = RawGraph::from_issues(&issues);
//! let bc = betweenness_centrality(&raw.centrality);
//! let result = hits(&raw.centrality, 100, 1e-6);
//! ```

use std::collections::HashMap;

use petgraph::{
    graph::DiGraph,
    visit::{IntoNodeIdentifiers, NodeIndexable},
};

pub mod betweenness;
pub mod eigenvector;
pub mod hits;
pub mod pagerank;

/// Map a node-indexed score vector back to issue IDs.
pub(crate) fn scores_by_id(g: &DiGraph<String, ()>, values: &[f64]) -> HashMap<String, f64> {
    let mut scores = HashMap::with_capacity(values.len());
    for node in g.node_identifiers() {
        if let Some(id) = g.node_weight(node) {
            scores.insert(id.clone(), values[g.to_index(node)]);
        }
    }
    scores
}

/// Sort scores descending, breaking ties by issue ID ascending.
#[must_use]
pub fn ranked(scores: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut out: Vec<(String, f64)> = scores.iter().map(|(id, s)| (id.clone(), *s)).collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Top `limit` entries of [`ranked`].
#[must_use]
pub fn top_n(scores: &HashMap<String, f64>, limit: usize) -> Vec<(String, f64)> {
    let mut out = ranked(scores);
    out.truncate(limit);
    out
}
