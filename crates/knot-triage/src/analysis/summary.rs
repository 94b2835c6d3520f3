//! Aggregate counts for external baseline comparison.

use serde::{Deserialize, Serialize};

use crate::analysis::store::GraphStats;

/// Whole-graph counts a drift comparator can snapshot and diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    /// Non-closed issues whose status is not `blocked`.
    pub open_count: usize,
    pub closed_count: usize,
    /// Issues whose status is `blocked`.
    pub blocked_count: usize,
    /// Blocking cycles; 0 until Phase 2 is published.
    pub cycle_count: usize,
    pub actionable_count: usize,
    pub phase2_complete: bool,
}

impl GraphStats {
    /// Snapshot of the aggregate counts. Never blocks.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        let p1 = self.phase1();
        let phase2 = self.phase2();
        GraphSummary {
            node_count: p1.node_count,
            edge_count: p1.edge_count,
            density: p1.density,
            open_count: p1.open_count + p1.in_progress_count,
            closed_count: p1.closed_count,
            blocked_count: p1.blocked_status_count,
            cycle_count: phase2.as_ref().map_or(0, |p| p.cycles.len()),
            actionable_count: p1.actionable_ids().len(),
            phase2_complete: phase2.is_some(),
        }
    }
}
