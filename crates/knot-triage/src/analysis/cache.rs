//! Fingerprint-keyed reuse of completed analyses.
//!
//! [`AnalysisCache`] remembers the most recent *completed* analysis, the
//! [`Fingerprint`] of the issue set it was computed from, and the
//! [`AnalysisConfig`] it ran with. A [`CachedAnalyzer`] over an unchanged
//! issue set and identical settings reuses that [`GraphStats`] instead of
//! recomputing. Entries are written by the Phase 2 completion listener; a
//! completion never replaces an entry from a newer [`Generation`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use knot_core::config::AnalysisConfig;
use knot_core::model::Issue;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::store::{Generation, GraphStats};
use crate::graph::Fingerprint;

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    config: AnalysisConfig,
    stats: Arc<GraphStats>,
}

/// Single-entry analysis cache. Share it with `Arc`.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entry: Mutex<Option<CacheEntry>>,
    computations: AtomicUsize,
    hits: AtomicUsize,
}

impl AnalysisCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed analysis of `fingerprint` under `config`, if it is the
    /// cached one.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint, config: &AnalysisConfig) -> Option<Arc<GraphStats>> {
        self.entry
            .lock()
            .as_ref()
            .filter(|e| {
                e.fingerprint == *fingerprint && e.config == *config && e.stats.is_phase2_ready()
            })
            .map(|e| Arc::clone(&e.stats))
    }

    /// Replace the cached entry unless it holds a newer generation.
    /// Returns whether `stats` was stored.
    pub fn store(&self, fingerprint: Fingerprint, config: AnalysisConfig, stats: Arc<GraphStats>) -> bool {
        let generation = stats.generation();
        let mut entry = self.entry.lock();
        if let Some(current) = entry.as_ref() {
            let current_generation = current.stats.generation();
            if current_generation > generation {
                debug!(%generation, newer = %current_generation, "dropping stale analysis");
                return false;
            }
        }
        debug!(%fingerprint, %generation, "caching analysis");
        *entry = Some(CacheEntry {
            fingerprint,
            config,
            stats,
        });
        true
    }

    /// Drop the cached entry.
    pub fn clear(&self) {
        *self.entry.lock() = None;
    }

    /// Fingerprint of the cached entry.
    #[must_use]
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.entry.lock().as_ref().map(|e| e.fingerprint)
    }

    /// Generation of the cached entry.
    #[must_use]
    pub fn generation(&self) -> Option<Generation> {
        self.entry.lock().as_ref().map(|e| e.stats.generation())
    }

    /// Number of fresh analyses started through this cache.
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Number of analyses served from the cache.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

/// An analysis that may have been served from an [`AnalysisCache`].
#[derive(Debug)]
pub struct CachedAnalyzer {
    fingerprint: Fingerprint,
    stats: Arc<GraphStats>,
    cache_hit: bool,
}

impl CachedAnalyzer {
    /// Analyze `issues`, reusing `cache` when the fingerprint matches.
    #[must_use]
    pub fn new(issues: &[Issue], cache: &Arc<AnalysisCache>) -> Self {
        Self::with_config(issues, AnalysisConfig::default(), cache)
    }

    /// Like [`CachedAnalyzer::new`]; a cached entry is reused only when it
    /// was computed with an equal `config`. The graph is built only on a
    /// miss.
    #[must_use]
    #[instrument(skip_all, fields(issues = issues.len()))]
    pub fn with_config(issues: &[Issue], config: AnalysisConfig, cache: &Arc<AnalysisCache>) -> Self {
        let fingerprint = Fingerprint::of(issues);

        if let Some(stats) = cache.get(&fingerprint, &config) {
            cache.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%fingerprint, generation = %stats.generation(), "analysis cache hit");
            return Self {
                fingerprint,
                stats,
                cache_hit: true,
            };
        }

        cache.computations.fetch_add(1, Ordering::Relaxed);
        let stats = Analyzer::with_config(issues, config.clone()).analyze_async();

        // The listener only holds weak references so a dropped store or
        // cache is never kept alive by a pending run.
        let weak_stats: Weak<GraphStats> = Arc::downgrade(&stats);
        let weak_cache: Weak<AnalysisCache> = Arc::downgrade(cache);
        stats.on_phase2(move |_, _| {
            if let (Some(stats), Some(cache)) = (weak_stats.upgrade(), weak_cache.upgrade()) {
                cache.store(fingerprint, config, stats);
            }
        });

        debug!(%fingerprint, generation = %stats.generation(), "analysis cache miss");
        Self {
            fingerprint,
            stats,
            cache_hit: false,
        }
    }

    #[must_use]
    pub fn stats(&self) -> Arc<GraphStats> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub const fn was_cache_hit(&self) -> bool {
        self.cache_hit
    }

    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
