#![forbid(unsafe_code)]
//! knot-triage library.
//!
//! Asynchronous graph analytics over issue dependency graphs: structural
//! statistics, centrality metrics, critical-path heights, cycle detection,
//! fingerprint caching, and triage recommendations.
//!
//! # Conventions
//!
//! - **Errors**: The analytics core is infallible; degenerate input yields
//!   documented defaults. Config loading returns `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//!
//! # Quick start
//!
//! ```rust,ignore
//! use knot_triage::{analyze_async, compute_triage};
//!
//! let stats = analyze_async(&issues);
//! let ready_now = stats.phase1().actionable_ids();
//! stats.wait_for_phase2();
//! let triage = compute_triage(&issues, &stats, &TriageConfig::default(), Utc::now());
//! ```

pub mod analysis;
pub mod graph;
pub mod metrics;
pub mod score;
pub mod triage;

pub use analysis::{
    AnalysisCache, Analyzer, CachedAnalyzer, Generation, GraphStats, GraphSummary, Insights,
    MetricKind, Phase1Stats, Phase2Stats, analyze_async, generate_insights,
};
pub use graph::{Fingerprint, RawGraph};
pub use triage::{TriageRecommendation, TriageResult, compute_triage, compute_triage_with_defaults};
