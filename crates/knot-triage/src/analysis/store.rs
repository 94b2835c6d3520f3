//! The result store: one write-once snapshot holder per analysis run.
//!
//! # Protocol
//!
//! A [`GraphStats`] is created with its [`Phase1Stats`] already filled in.
//! Exactly one [`Phase2Stats`] snapshot is later published into it:
//!
//! 1. Under the state mutex the snapshot is swapped into an
//!    [`ArcSwapOption`] and pending completion listeners are taken.
//!    Readers load the snapshot without locking and see either nothing or
//!    the complete snapshot.
//! 2. Listeners run on the publishing thread, outside the lock.
//! 3. The store is marked ready and the [`Condvar`] is broadcast, so a
//!    thread returning from [`GraphStats::wait_for_phase2`] also observes
//!    every listener's effects.
//!
//! A second publish is ignored with a warning.
//!
//! # Generations
//!
//! Every store carries a process-unique, increasing [`Generation`].
//! Completion listeners receive it so a consumer that has since moved on
//! to a newer store can recognise and drop stale results.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::analysis::phase1::Phase1Stats;
use crate::analysis::phase2::{MetricKind, Phase2Stats};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of one [`GraphStats`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// `true` when this generation belongs to `stats`.
    #[must_use]
    pub fn is_current_for(self, stats: &GraphStats) -> bool {
        stats.generation == self
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

type Listener = Box<dyn FnOnce(Generation, Arc<Phase2Stats>) + Send + 'static>;

#[derive(Default)]
struct State {
    published: bool,
    ready: bool,
    listeners: Vec<Listener>,
    /// Thread running the listeners, set between publish and ready.
    notifier: Option<ThreadId>,
}

/// Thread-safe holder of one analysis run's results.
pub struct GraphStats {
    generation: Generation,
    phase1: Phase1Stats,
    phase2: ArcSwapOption<Phase2Stats>,
    state: Mutex<State>,
    published: Condvar,
}

impl GraphStats {
    /// New store with Phase 1 populated and Phase 2 pending.
    #[must_use]
    pub fn new(phase1: Phase1Stats) -> Self {
        Self {
            generation: Generation::next(),
            phase1,
            phase2: ArcSwapOption::empty(),
            state: Mutex::new(State::default()),
            published: Condvar::new(),
        }
    }

    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub const fn phase1(&self) -> &Phase1Stats {
        &self.phase1
    }

    /// The published Phase 2 snapshot, if any. Never blocks.
    #[must_use]
    pub fn phase2(&self) -> Option<Arc<Phase2Stats>> {
        self.phase2.load_full()
    }

    #[must_use]
    pub fn is_phase2_ready(&self) -> bool {
        self.phase2.load().is_some()
    }

    /// Publish the Phase 2 snapshot. Returns `false`, leaving the first
    /// snapshot in place, if one was already published.
    pub(crate) fn publish(&self, stats: Phase2Stats) -> bool {
        let stats = Arc::new(stats);
        let listeners = {
            let mut state = self.state.lock();
            if state.published {
                warn!(generation = %self.generation, "phase 2 already published, ignoring");
                return false;
            }
            self.phase2.store(Some(Arc::clone(&stats)));
            state.published = true;
            state.notifier = Some(thread::current().id());
            std::mem::take(&mut state.listeners)
        };

        debug!(
            generation = %self.generation,
            listeners = listeners.len(),
            "phase 2 published"
        );
        for listener in listeners {
            listener(self.generation, Arc::clone(&stats));
        }

        {
            let mut state = self.state.lock();
            state.ready = true;
            state.notifier = None;
        }
        self.published.notify_all();
        true
    }

    /// Register a completion callback.
    ///
    /// Runs on the publishing thread once Phase 2 is published, or
    /// immediately on the calling thread if it already is. A callback may
    /// call [`GraphStats::wait_for_phase2`] on the same store; it returns
    /// at once because the snapshot is already in place.
    pub fn on_phase2<F>(&self, callback: F)
    where
        F: FnOnce(Generation, Arc<Phase2Stats>) + Send + 'static,
    {
        let published = {
            let mut state = self.state.lock();
            if state.published {
                self.phase2.load_full()
            } else {
                state.listeners.push(Box::new(callback));
                return;
            }
        };
        if let Some(stats) = published {
            callback(self.generation, stats);
        }
    }

    /// Block until Phase 2 is published and every completion listener
    /// has run. Called from inside a listener it only waits for the
    /// snapshot, which is already published.
    pub fn wait_for_phase2(&self) {
        let mut state = self.state.lock();
        while !state.ready && !Self::is_notifier(&state) {
            self.published.wait(&mut state);
        }
    }

    /// Block until Phase 2 is published or `timeout` elapses. Returns
    /// whether Phase 2 is ready.
    #[must_use]
    pub fn wait_for_phase2_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.ready && !Self::is_notifier(&state) {
            if self.published.wait_until(&mut state, deadline).timed_out() {
                return state.ready || Self::is_notifier(&state);
            }
        }
        true
    }

    fn is_notifier(state: &State) -> bool {
        state.notifier == Some(thread::current().id())
    }

    /// Score of `id` for `kind`. `0.0` before publication or for unknown
    /// issues.
    #[must_use]
    pub fn score(&self, kind: MetricKind, id: &str) -> f64 {
        match &*self.phase2.load() {
            Some(p) => p.score(kind, id),
            None => 0.0,
        }
    }

    #[must_use]
    pub fn pagerank_score(&self, id: &str) -> f64 {
        self.score(MetricKind::PageRank, id)
    }

    #[must_use]
    pub fn betweenness_score(&self, id: &str) -> f64 {
        self.score(MetricKind::Betweenness, id)
    }

    #[must_use]
    pub fn eigenvector_score(&self, id: &str) -> f64 {
        self.score(MetricKind::Eigenvector, id)
    }

    #[must_use]
    pub fn hub_score(&self, id: &str) -> f64 {
        self.score(MetricKind::Hub, id)
    }

    #[must_use]
    pub fn authority_score(&self, id: &str) -> f64 {
        self.score(MetricKind::Authority, id)
    }

    /// Height of `id` on the blocking graph;
    /// [`UNRELIABLE_HEIGHT`](crate::graph::UNRELIABLE_HEIGHT) when on or
    /// above a cycle.
    #[must_use]
    pub fn critical_path_score(&self, id: &str) -> f64 {
        self.score(MetricKind::CriticalPath, id)
    }

    /// Blocking cycles. Empty before publication.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.phase2().map(|p| p.cycles.clone()).unwrap_or_default()
    }
}

impl fmt::Debug for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStats")
            .field("generation", &self.generation)
            .field("nodes", &self.phase1.node_count)
            .field("phase2_ready", &self.is_phase2_ready())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
