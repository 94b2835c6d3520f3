//! Dependency cycle detection.
//!
//! Runs Tarjan's SCC decomposition once over the blocking graph. Every SCC
//! with more than one member, and every node with a self-loop, is a cycle.
//! O(V+E).

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;

/// Cycles found in a graph, plus per-node membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Each cycle is a sorted list of issue IDs; the list itself is sorted.
    pub cycles: Vec<Vec<String>>,
    /// `on_cycle[i]` is `true` when node `i` belongs to a reported cycle.
    pub on_cycle: Vec<bool>,
}

impl CycleReport {
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        !self.cycles.is_empty()
    }

    #[must_use]
    pub fn is_on_cycle(&self, idx: NodeIndex) -> bool {
        self.on_cycle.get(idx.index()).copied().unwrap_or(false)
    }
}

/// Find all cycles currently present in `graph`.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn detect_cycles(graph: &DiGraph<String, ()>) -> CycleReport {
    let mut on_cycle = vec![false; graph.node_count()];

    let mut cycles: Vec<Vec<String>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|node| has_self_loop(graph, *node))
        })
        .map(|component| {
            for idx in &component {
                on_cycle[idx.index()] = true;
            }
            let mut ids: Vec<String> = component.into_iter().map(|idx| node_id(graph, idx)).collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    cycles.sort_unstable();
    CycleReport { cycles, on_cycle }
}

/// Convenience wrapper returning only the cycle list.
#[must_use]
pub fn find_all_cycles(graph: &DiGraph<String, ()>) -> Vec<Vec<String>> {
    detect_cycles(graph).cycles
}

fn has_self_loop(graph: &DiGraph<String, ()>, node: NodeIndex) -> bool {
    graph.find_edge(node, node).is_some()
}

fn node_id(graph: &DiGraph<String, ()>, idx: NodeIndex) -> String {
    graph
        .node_weight(idx)
        .cloned()
        .unwrap_or_else(|| format!("#{}", idx.index()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> DiGraph<String, ()> {
        let mut g = DiGraph::<String, ()>::new();
        let idx: Vec<NodeIndex> = nodes.iter().map(|n| g.add_node((*n).to_string())).collect();
        let find = |id: &str| idx[nodes.iter().position(|n| *n == id).expect("known node")];
        for (a, b) in edges {
            g.add_edge(find(a), find(b), ());
        }
        g
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let report = detect_cycles(&g);
        assert!(!report.has_cycle());
        assert!(report.on_cycle.iter().all(|c| !c));
    }

    #[test]
    fn two_node_cycle_reported_once() {
        let g = graph(&["B", "A"], &[("A", "B"), ("B", "A")]);
        let report = detect_cycles(&g);
        assert_eq!(report.cycles, vec![vec!["A".to_string(), "B".to_string()]]);
        assert!(report.on_cycle.iter().all(|c| *c));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let g = graph(&["A", "B"], &[("A", "A"), ("A", "B")]);
        let report = detect_cycles(&g);
        assert_eq!(report.cycles, vec![vec!["A".to_string()]]);
        assert!(report.is_on_cycle(NodeIndex::new(0)));
        assert!(!report.is_on_cycle(NodeIndex::new(1)));
    }

    #[test]
    fn multiple_cycles_sorted() {
        let g = graph(
            &["X", "Y", "A", "B", "C"],
            &[("X", "Y"), ("Y", "X"), ("A", "B"), ("B", "C"), ("C", "A")],
        );
        assert_eq!(
            find_all_cycles(&g),
            vec![
                vec!["A".to_string(), "B".to_string(), "C".to_string()],
                vec!["X".to_string(), "Y".to_string()],
            ]
        );
    }
}
