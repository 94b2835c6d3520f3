//! Graph construction from an issue set.
//!
//! # Overview
//!
//! [`RawGraph::from_issues`] turns the caller's issues into three petgraph
//! views that share node indices:
//!
//! - `graph`: every validated dependency, one edge per `(from, to, kind)`.
//! - `centrality`: the simple graph used by centrality metrics (parallel
//!   edges merged across kinds, self-loops dropped).
//! - `blocking`: only `blocks` edges, self-loops kept so cycle detection
//!   can report them.
//!
//! ## Edge Direction
//!
//! An edge `B → A` means "B **depends on** A". For a `blocks` edge this
//! reads "A blocks B", so importance flows from dependents toward the work
//! that unblocks them.
//!
//! ## Validation
//!
//! Absent dependency entries are skipped. Dependencies whose endpoints are
//! not both in the issue set are dropped and counted in
//! [`RawGraph::dropped_edges`]. Node order follows sorted issue ids and
//! edges are inserted in sorted order, so two permutations of the same
//! issue set build identical graphs.

use std::collections::{BTreeSet, HashMap};

use knot_core::model::{DependencyKind, Issue, Status};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// RawGraph
// ---------------------------------------------------------------------------

/// A directed dependency graph built from issues.
///
/// Nodes are issue IDs. Read-only after construction.
#[derive(Debug, Clone)]
pub struct RawGraph {
    /// All validated dependencies, kinds preserved.
    pub graph: DiGraph<String, DependencyKind>,
    /// Simple graph for centrality metrics: all kinds, no parallel edges,
    /// no self-loops.
    pub centrality: DiGraph<String, ()>,
    /// Blocking-only graph (deduplicated, self-loops kept).
    pub blocking: DiGraph<String, ()>,
    /// Mapping from issue ID to petgraph `NodeIndex` (shared by all views).
    pub node_map: HashMap<String, NodeIndex>,
    /// Issue status per node, indexed by `NodeIndex::index()`.
    pub status: Vec<Status>,
    /// Issue priority per node, indexed by `NodeIndex::index()`.
    pub priority: Vec<i32>,
    /// Number of dependency entries dropped because an endpoint is unknown.
    pub dropped_edges: usize,
}

impl RawGraph {
    /// Build a [`RawGraph`] from `issues`.
    ///
    /// Duplicate issue IDs keep the first occurrence.
    #[must_use]
    #[instrument(skip(issues), fields(issues = issues.len()))]
    pub fn from_issues(issues: &[Issue]) -> Self {
        // Step 1: pick one issue per ID and order nodes by ID.
        let mut by_id: HashMap<&str, &Issue> = HashMap::with_capacity(issues.len());
        for issue in issues {
            if by_id.contains_key(issue.id.as_str()) {
                warn!(id = %issue.id, "duplicate issue id, keeping first occurrence");
                continue;
            }
            by_id.insert(issue.id.as_str(), issue);
        }
        let mut ids: Vec<&str> = by_id.keys().copied().collect();
        ids.sort_unstable();

        let mut graph = DiGraph::<String, DependencyKind>::with_capacity(ids.len(), 0);
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(ids.len());
        let mut status = Vec::with_capacity(ids.len());
        let mut priority = Vec::with_capacity(ids.len());

        for id in &ids {
            let idx = graph.add_node((*id).to_string());
            node_map.insert((*id).to_string(), idx);
            let issue = by_id[id];
            status.push(issue.status);
            priority.push(issue.priority);
        }

        // Step 2: resolve dependencies into validated, sorted edges.
        let mut edges: BTreeSet<(NodeIndex, NodeIndex, DependencyKind)> = BTreeSet::new();
        let mut dropped_edges = 0;

        for id in &ids {
            for dep in by_id[id].deps() {
                match resolve(&node_map, &dep.issue_id, &dep.depends_on_id) {
                    Some((from, to)) => {
                        edges.insert((from, to, dep.kind));
                    }
                    None => {
                        dropped_edges += 1;
                        debug!(
                            from = %dep.issue_id,
                            to = %dep.depends_on_id,
                            "dropping dependency with unknown endpoint"
                        );
                    }
                }
            }
        }

        // Step 3: populate the three views.
        let mut centrality = graph.map(|_, id| id.clone(), |_, _| ());
        let mut blocking = centrality.clone();

        for &(from, to, kind) in &edges {
            graph.add_edge(from, to, kind);

            if from != to && !centrality.contains_edge(from, to) {
                centrality.add_edge(from, to, ());
            }
            if kind.is_blocking() && !blocking.contains_edge(from, to) {
                blocking.add_edge(from, to, ());
            }
        }

        Self {
            graph,
            centrality,
            blocking,
            node_map,
            status,
            priority,
            dropped_edges,
        }
    }

    /// Return the number of nodes (issues) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of validated dependency edges (all kinds).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for an issue ID.
    #[must_use]
    pub fn node_index(&self, issue_id: &str) -> Option<NodeIndex> {
        self.node_map.get(issue_id).copied()
    }

    /// Return the issue ID label for a node.
    #[must_use]
    pub fn issue_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Status of the issue at `idx`.
    #[must_use]
    pub fn status_of(&self, idx: NodeIndex) -> Option<Status> {
        self.status.get(idx.index()).copied()
    }

    /// Iterate issue IDs in node order (sorted).
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }
}

fn resolve(
    node_map: &HashMap<String, NodeIndex>,
    from: &str,
    to: &str,
) -> Option<(NodeIndex, NodeIndex)> {
    Some((*node_map.get(from)?, *node_map.get(to)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
