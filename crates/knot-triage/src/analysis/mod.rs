//! Two-phase analysis of an issue dependency graph.
//!
//! # Overview
//!
//! ```text
//! &[Issue] ── Analyzer::new ──► RawGraph
//!                                  │
//!             Phase1Stats::compute │ (calling thread)
//!                                  ▼
//!                      Arc<GraphStats> ◄── returned immediately
//!                                  ▲
//!               compute_phase2 ────┘ (background thread, publishes once)
//! ```
//!
//! Readers call the non-blocking score getters on [`GraphStats`] at any
//! time and get `0.0` until Phase 2 lands. [`GraphStats::wait_for_phase2`]
//! blocks until it does. [`CachedAnalyzer`] skips the whole pipeline when
//! the issue set's [`Fingerprint`](crate::graph::Fingerprint) matches the
//! last completed run.

pub mod analyzer;
pub mod cache;
pub mod insights;
pub mod phase1;
pub mod phase2;
pub mod store;
pub mod summary;

pub use analyzer::{Analyzer, analyze_async};
pub use cache::{AnalysisCache, CachedAnalyzer};
pub use insights::{InsightItem, Insights, generate_insights};
pub use phase1::Phase1Stats;
pub use phase2::{Convergence, MetricKind, Phase2Stats, Phase2Timings, compute_phase2};
pub use store::{Generation, GraphStats};
pub use summary::GraphSummary;
