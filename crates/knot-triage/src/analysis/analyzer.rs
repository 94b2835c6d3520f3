//! Two-phase analysis driver.
//!
//! [`Analyzer::analyze_async`] computes Phase 1 on the calling thread,
//! hands back an `Arc<GraphStats>`, and publishes Phase 2 from a detached
//! worker thread. [`Analyzer::analyze`] does both inline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use knot_core::config::{AnalysisConfig, load_project_config};
use knot_core::model::Issue;
use tracing::{info, instrument, warn};

use crate::analysis::phase1::Phase1Stats;
use crate::analysis::phase2::compute_phase2;
use crate::analysis::store::GraphStats;
use crate::graph::RawGraph;

/// Graph plus analysis settings, ready to produce [`GraphStats`].
#[derive(Debug, Clone)]
pub struct Analyzer {
    raw: Arc<RawGraph>,
    config: AnalysisConfig,
}

impl Analyzer {
    /// Build the dependency graph for `issues` with default settings.
    #[must_use]
    pub fn new(issues: &[Issue]) -> Self {
        Self::with_config(issues, AnalysisConfig::default())
    }

    #[must_use]
    pub fn with_config(issues: &[Issue], config: AnalysisConfig) -> Self {
        Self {
            raw: Arc::new(RawGraph::from_issues(issues)),
            config,
        }
    }

    /// Build with the `[analysis]` settings from the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project config exists but cannot be read,
    /// parsed, or validated.
    pub fn from_project(issues: &[Issue], root: &Path) -> Result<Self> {
        let config = load_project_config(root)
            .with_context(|| format!("loading analysis settings for {}", root.display()))?;
        Ok(Self::with_config(issues, config.analysis))
    }

    #[must_use]
    pub fn graph(&self) -> &RawGraph {
        &self.raw
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Start an analysis run. Phase 1 is ready on return; Phase 2 is
    /// published later from a background thread.
    #[must_use]
    #[instrument(skip(self), fields(nodes = self.raw.node_count()))]
    pub fn analyze_async(&self) -> Arc<GraphStats> {
        let stats = Arc::new(GraphStats::new(Phase1Stats::compute(&self.raw)));
        let generation = stats.generation();

        let worker = {
            let stats = Arc::clone(&stats);
            let raw = Arc::clone(&self.raw);
            let config = self.config.clone();
            move || {
                stats.publish(compute_phase2(&raw, &config));
            }
        };

        let spawned = std::thread::Builder::new()
            .name(format!("knot-phase2-{}", generation.get()))
            .spawn(worker.clone());

        match spawned {
            Ok(_) => info!(%generation, "phase 2 started in background"),
            Err(e) => {
                warn!(%generation, error = %e, "could not spawn phase 2 worker, computing inline");
                worker();
            }
        }

        stats
    }

    /// Run both phases on the calling thread. The returned store is
    /// already published.
    #[must_use]
    #[instrument(skip(self), fields(nodes = self.raw.node_count()))]
    pub fn analyze(&self) -> Arc<GraphStats> {
        let stats = Arc::new(GraphStats::new(Phase1Stats::compute(&self.raw)));
        stats.publish(compute_phase2(&self.raw, &self.config));
        stats
    }
}

/// Shorthand for `Analyzer::new(issues).analyze_async()`.
#[must_use]
pub fn analyze_async(issues: &[Issue]) -> Arc<GraphStats> {
    Analyzer::new(issues).analyze_async()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn issues() -> Vec<Issue> {
        vec![Issue::new("a", "a"), Issue::new("b", "b").blocked_by("a")]
    }

    #[test]
    fn phase1_is_ready_immediately() {
        let stats = analyze_async(&issues());
        assert_eq!(stats.phase1().node_count, 2);
        assert!(stats.phase1().is_blocked("b"));
        stats.wait_for_phase2();
        assert!(stats.is_phase2_ready());
        assert!(stats.pagerank_score("a") > stats.pagerank_score("b"));
    }

    #[test]
    fn sync_analysis_is_published() {
        let stats = Analyzer::new(&issues()).analyze();
        assert!(stats.is_phase2_ready());
        assert!((stats.critical_path_score("a") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn each_run_gets_a_new_generation() {
        let analyzer = Analyzer::new(&issues());
        let first = analyzer.analyze_async();
        let second = analyzer.analyze_async();
        assert_ne!(first.generation(), second.generation());
        assert!(first.wait_for_phase2_timeout(Duration::from_secs(10)));
        assert!(second.wait_for_phase2_timeout(Duration::from_secs(10)));
    }

    #[test]
    fn project_config_is_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".knot")).expect("mkdir");
        std::fs::write(
            dir.path().join(".knot/config.toml"),
            "[analysis]\nparallel = false\nmax_iter = 5\n",
        )
        .expect("write config");

        let analyzer = Analyzer::from_project(&issues(), dir.path()).expect("load");
        assert!(!analyzer.config().parallel);
        assert_eq!(analyzer.config().max_iter, 5);
    }

    #[test]
    fn invalid_project_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".knot")).expect("mkdir");
        std::fs::write(dir.path().join(".knot/config.toml"), "[analysis]\ndamping = 7.0\n")
            .expect("write config");

        assert!(Analyzer::from_project(&issues(), dir.path()).is_err());
    }
}
