//! Dependency graph module for triage computation.
//!
//! # Overview
//!
//! This module builds a petgraph-based directed dependency graph from the
//! caller's issues and provides the structural algorithms that work on the
//! blocking subgraph.
//!
//! ## Pipeline
//!
//! ```text
//! &[Issue]
//!        ↓  build::RawGraph::from_issues()
//! RawGraph (graph / centrality / blocking views)
//!        ↓  cycles::detect_cycles(&raw.blocking)
//! CycleReport (Tarjan SCCs of size > 1, self-loops)
//!        ↓  critical_path::compute_heights(&raw.blocking, &report)
//! CriticalPathResult (per-issue height, longest chain)
//! ```
//!
//! ## Cache Invalidation
//!
//! [`Fingerprint::of`] hashes the structural content of an issue set
//! independently of ordering. Compare it against a stored value to decide
//! whether an earlier analysis can be reused.

pub mod build;
pub mod critical_path;
pub mod cycles;
pub mod fingerprint;

// Re-export primary types at module level for convenience.
pub use build::RawGraph;
pub use critical_path::{CriticalPathResult, Height, UNRELIABLE_HEIGHT, compute_heights};
pub use cycles::{CycleReport, detect_cycles, find_all_cycles};
pub use fingerprint::Fingerprint;
