//! Deep analytics: centralities, heights, and cycles.
//!
//! [`compute_phase2`] runs every iterative algorithm over a [`RawGraph`]
//! and assembles one immutable [`Phase2Stats`] snapshot. With
//! [`AnalysisConfig::parallel`] set the independent algorithms run on
//! scoped threads; otherwise one after another.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use knot_core::config::AnalysisConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::graph::{CriticalPathResult, RawGraph, compute_heights, detect_cycles};
use crate::metrics::{
    betweenness::betweenness_centrality,
    eigenvector::{EigenvectorResult, eigenvector_centrality},
    hits::{HitsResult, hits},
    pagerank::{PageRankConfig, PageRankResult, pagerank},
};

/// Per-node metric selector for [`GraphStats::score`](crate::analysis::GraphStats::score).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    PageRank,
    Betweenness,
    Eigenvector,
    Hub,
    Authority,
    CriticalPath,
}

impl MetricKind {
    pub const ALL: [Self; 6] = [
        Self::PageRank,
        Self::Betweenness,
        Self::Eigenvector,
        Self::Hub,
        Self::Authority,
        Self::CriticalPath,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageRank => "pagerank",
            Self::Betweenness => "betweenness",
            Self::Eigenvector => "eigenvector",
            Self::Hub => "hub",
            Self::Authority => "authority",
            Self::CriticalPath => "critical_path",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall time spent in each algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Phase2Timings {
    pub pagerank: Duration,
    pub betweenness: Duration,
    pub eigenvector: Duration,
    pub hits: Duration,
    pub critical_path: Duration,
    /// End-to-end, including assembly.
    pub total: Duration,
}

/// Iteration counts and convergence flags of the iterative algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Convergence {
    pub pagerank_iterations: usize,
    pub pagerank_converged: bool,
    pub eigenvector_iterations: usize,
    pub eigenvector_converged: bool,
    pub hits_iterations: usize,
    pub hits_converged: bool,
}

/// Immutable snapshot of every Phase 2 result.
#[derive(Debug, Clone, Default)]
pub struct Phase2Stats {
    pub pagerank: HashMap<String, f64>,
    pub betweenness: HashMap<String, f64>,
    pub eigenvector: HashMap<String, f64>,
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    /// Heights, longest chain and cycle flag over `blocks` edges.
    pub critical_path: CriticalPathResult,
    /// Blocking cycles, each sorted by ID; the list is sorted.
    pub cycles: Vec<Vec<String>>,
    pub convergence: Convergence,
    pub timings: Phase2Timings,
}

impl Phase2Stats {
    /// Score of `id` for `kind`; `0.0` for unknown issues.
    ///
    /// Critical-path scores of issues on or above a blocking cycle are
    /// [`UNRELIABLE_HEIGHT`](crate::graph::UNRELIABLE_HEIGHT).
    #[must_use]
    pub fn score(&self, kind: MetricKind, id: &str) -> f64 {
        match kind {
            MetricKind::CriticalPath => self
                .critical_path
                .height(id)
                .map_or(0.0, crate::graph::Height::as_score),
            _ => self.metric(kind).and_then(|m| m.get(id)).copied().unwrap_or(0.0),
        }
    }

    /// Full score map for a centrality metric. `None` for
    /// [`MetricKind::CriticalPath`], whose values live in
    /// [`Phase2Stats::critical_path`].
    #[must_use]
    pub const fn metric(&self, kind: MetricKind) -> Option<&HashMap<String, f64>> {
        match kind {
            MetricKind::PageRank => Some(&self.pagerank),
            MetricKind::Betweenness => Some(&self.betweenness),
            MetricKind::Eigenvector => Some(&self.eigenvector),
            MetricKind::Hub => Some(&self.hubs),
            MetricKind::Authority => Some(&self.authorities),
            MetricKind::CriticalPath => None,
        }
    }

    /// Critical-path scores keyed by issue ID, unreliable heights as the
    /// sentinel value.
    #[must_use]
    pub fn critical_path_scores(&self) -> HashMap<String, f64> {
        self.critical_path
            .heights
            .iter()
            .map(|(id, h)| (id.clone(), h.as_score()))
            .collect()
    }

    #[must_use]
    pub fn has_cycle(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Run every Phase 2 algorithm over `raw`.
#[must_use]
#[instrument(skip(raw, config), fields(nodes = raw.node_count(), parallel = config.parallel))]
pub fn compute_phase2(raw: &RawGraph, config: &AnalysisConfig) -> Phase2Stats {
    let started = Instant::now();
    let pr_config = PageRankConfig::from(config);
    let g = &raw.centrality;

    let run_pagerank = || timed(|| pagerank(g, &pr_config));
    let run_betweenness = || timed(|| betweenness_centrality(g));
    let run_eigenvector =
        || timed(|| eigenvector_centrality(g, config.eigenvector_max_iter, config.tolerance));
    let run_hits = || timed(|| hits(g, config.hits_max_iter, config.tolerance));
    let run_heights = || {
        timed(|| {
            let report = detect_cycles(&raw.blocking);
            let heights = compute_heights(&raw.blocking, &report);
            (report.cycles, heights)
        })
    };

    let (pr, bc, ev, ht, cp) = if config.parallel && raw.node_count() > 1 {
        std::thread::scope(|s| {
            let pr = s.spawn(run_pagerank);
            let bc = s.spawn(run_betweenness);
            let ev = s.spawn(run_eigenvector);
            let ht = s.spawn(run_hits);
            // Heights are cheap; keep them on this thread.
            let cp = run_heights();
            (join(pr), join(bc), join(ev), join(ht), cp)
        })
    } else {
        (
            run_pagerank(),
            run_betweenness(),
            run_eigenvector(),
            run_hits(),
            run_heights(),
        )
    };

    let (pr, pagerank_time): (PageRankResult, Duration) = pr;
    let (betweenness, betweenness_time) = bc;
    let (ev, eigenvector_time): (EigenvectorResult, Duration) = ev;
    let (ht, hits_time): (HitsResult, Duration) = ht;
    let ((cycles, critical_path), critical_path_time) = cp;

    let stats = Phase2Stats {
        pagerank: pr.scores,
        betweenness,
        eigenvector: ev.scores,
        hubs: ht.hubs,
        authorities: ht.authorities,
        critical_path,
        cycles,
        convergence: Convergence {
            pagerank_iterations: pr.iterations,
            pagerank_converged: pr.converged,
            eigenvector_iterations: ev.iterations,
            eigenvector_converged: ev.converged,
            hits_iterations: ht.iterations,
            hits_converged: ht.converged,
        },
        timings: Phase2Timings {
            pagerank: pagerank_time,
            betweenness: betweenness_time,
            eigenvector: eigenvector_time,
            hits: hits_time,
            critical_path: critical_path_time,
            total: started.elapsed(),
        },
    };

    debug!(
        pagerank_ms = stats.timings.pagerank.as_millis(),
        betweenness_ms = stats.timings.betweenness.as_millis(),
        eigenvector_ms = stats.timings.eigenvector.as_millis(),
        hits_ms = stats.timings.hits.as_millis(),
        critical_path_ms = stats.timings.critical_path.as_millis(),
        total_ms = stats.timings.total.as_millis(),
        cycles = stats.cycles.len(),
        "phase 2 computed"
    );

    stats
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

fn join<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
