//! Triage: ranked, explained recommendations over an analysis.
//!
//! # Overview
//!
//! [`compute_triage`] scores every non-closed issue with the composite
//! formula from [`crate::score`], explains each score, and extracts the
//! short lists a planner acts on:
//!
//! - **recommendations**: every non-closed issue, best first.
//! - **quick wins**: actionable, low effort, above-median impact.
//! - **blockers to clear**: issues whose closure frees other work.
//! - **quick ref**: the top actionable picks plus headline counts.
//!
//! Triage never waits for Phase 2. Against a pending [`GraphStats`] the
//! graph-derived components score 0 and [`TriageMeta::phase2_complete`]
//! is `false`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use knot_core::config::TriageConfig;
use knot_core::model::{Issue, MAX_PRIORITY, Status};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analysis::{Analyzer, GraphStats, Phase1Stats, Phase2Stats};
use crate::graph::Height;
use crate::score::{
    Component, ComponentInputs, ScoreBreakdown, composite_score, normalize_by_max,
    normalize_metric,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Scored, explained view of one non-closed issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageRecommendation {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: i32,
    /// Composite score in `[0, 1]`, blocked penalty applied.
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Human-readable reasons, most significant first.
    pub reasons: Vec<String>,
    /// Issues that become free of open blockers if this one closes.
    pub unblocks: Vec<String>,
    /// Open blockers of this issue.
    pub blocked_by: Vec<String>,
    pub actionable: bool,
    pub quick_win: bool,
    pub significant_blocker: bool,
    /// Member of a blocking cycle.
    pub in_cycle: bool,
}

/// An issue worth closing for what it frees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerToClear {
    pub id: String,
    pub title: String,
    pub unblocks: Vec<String>,
    /// `Σ (MAX_PRIORITY + 1 - priority)` over the freed issues.
    pub unblocked_priority_weight: i64,
    /// Whether the blocker itself can be worked on now.
    pub actionable: bool,
}

/// One of the top actionable picks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPick {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub reason: Option<String>,
}

/// Headline view for a quick glance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickRef {
    pub top_picks: Vec<TopPick>,
    pub open_count: usize,
    pub actionable_count: usize,
    pub blocked_count: usize,
    pub in_progress_count: usize,
    pub cycle_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageMeta {
    /// Generation of the analysis the result was computed from.
    pub generation: u64,
    pub issue_count: usize,
    pub phase2_complete: bool,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub meta: TriageMeta,
    /// Ranked by score desc, then priority, then ID.
    pub recommendations: Vec<TriageRecommendation>,
    pub quick_wins: Vec<TriageRecommendation>,
    /// Ranked by freed count desc, then priority weight desc, then ID.
    pub blockers_to_clear: Vec<BlockerToClear>,
    pub quick_ref: QuickRef,
}

impl TriageResult {
    /// Recommendation for `id`, if it is non-closed.
    #[must_use]
    pub fn recommendation(&self, id: &str) -> Option<&TriageRecommendation> {
        self.recommendations.iter().find(|r| r.id == id)
    }

    /// Rank of `id` in `recommendations`, 0 being best.
    #[must_use]
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.recommendations.iter().position(|r| r.id == id)
    }
}

// ---------------------------------------------------------------------------
// Triage
// ---------------------------------------------------------------------------

/// Score and rank `issues` against `stats`.
///
/// `issues` should be the set `stats` was computed from. Duplicate IDs
/// keep the first occurrence. Never blocks.
#[must_use]
#[instrument(skip_all, fields(issues = issues.len(), generation = %stats.generation()))]
pub fn compute_triage(
    issues: &[Issue],
    stats: &GraphStats,
    config: &TriageConfig,
    now: DateTime<Utc>,
) -> TriageResult {
    let p1 = stats.phase1();
    let p2 = stats.phase2();

    let by_id: HashMap<&str, &Issue> = {
        let mut map = HashMap::with_capacity(issues.len());
        for issue in issues {
            map.entry(issue.id.as_str()).or_insert(issue);
        }
        map
    };

    let mut active: Vec<&Issue> = by_id
        .values()
        .copied()
        .filter(|i| !i.status.is_closed())
        .collect();
    active.sort_unstable_by(|a, b| a.id.cmp(&b.id));

    let in_cycle: HashSet<&str> = p2
        .as_deref()
        .map(|p| p.cycles.iter().flatten().map(String::as_str).collect())
        .unwrap_or_default();

    // Raw per-issue signals, normalized over the non-closed set.
    let pagerank_raw: Vec<f64> = active.iter().map(|i| stats.pagerank_score(&i.id)).collect();
    let height_raw: Vec<f64> = active
        .iter()
        .map(|i| reliable_height(p2.as_deref(), &i.id))
        .collect();
    let unblocks: Vec<Vec<String>> = active.iter().map(|i| p1.unblocks(&i.id)).collect();
    let unblocks_raw: Vec<f64> = unblocks.iter().map(|u| u.len() as f64).collect();

    let impact = normalize_metric(&pagerank_raw);
    let height = normalize_by_max(&height_raw);
    let unblocks_norm = normalize_by_max(&unblocks_raw);
    let pagerank_median = median(&pagerank_raw);

    let mut recommendations: Vec<TriageRecommendation> = Vec::with_capacity(active.len());
    let mut blockers_to_clear: Vec<BlockerToClear> = Vec::new();

    for (idx, issue) in active.iter().enumerate() {
        let age_days = ((now - issue.updated_at).num_seconds().max(0) as f64) / SECONDS_PER_DAY;
        let breakdown = ScoreBreakdown::from_inputs(
            &ComponentInputs {
                priority: issue.priority,
                impact: impact[idx],
                critical_path: height[idx],
                unblocks: unblocks_norm[idx],
                age_days,
            },
            config.stale_after_days,
        );

        let actionable = p1.is_actionable(&issue.id);
        let blocked_by = p1.open_blockers(&issue.id).to_vec();
        let mut score = composite_score(&breakdown, &config.weights);
        if !actionable {
            score *= config.blocked_penalty;
        }

        let freed = &unblocks[idx];
        let freed_weight = priority_weight(freed, &by_id);
        let significant_blocker = !freed.is_empty()
            && (freed.len() >= config.blocker_min_unblocks
                || freed_weight >= config.blocker_min_priority_weight);

        let quick_win = actionable
            && is_low_effort(issue, p1, config)
            && pagerank_raw[idx] > pagerank_median;

        let on_cycle = in_cycle.contains(issue.id.as_str());

        let reasons = explain(
            issue,
            &breakdown,
            config,
            &ReasonContext {
                pagerank: pagerank_raw[idx],
                height: height_raw[idx],
                unblocks: freed.len(),
                age_days,
                blocked_by: blocked_by.len(),
                on_cycle,
            },
        );

        if significant_blocker {
            blockers_to_clear.push(BlockerToClear {
                id: issue.id.clone(),
                title: issue.title.clone(),
                unblocks: freed.clone(),
                unblocked_priority_weight: freed_weight,
                actionable,
            });
        }

        recommendations.push(TriageRecommendation {
            id: issue.id.clone(),
            title: issue.title.clone(),
            status: issue.status,
            priority: issue.priority,
            score,
            breakdown,
            reasons,
            unblocks: freed.clone(),
            blocked_by,
            actionable,
            quick_win,
            significant_blocker,
            in_cycle: on_cycle,
        });
    }

    recommendations.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| a.id.cmp(&b.id))
    });

    blockers_to_clear.sort_by(|a, b| {
        b.unblocks
            .len()
            .cmp(&a.unblocks.len())
            .then_with(|| b.unblocked_priority_weight.cmp(&a.unblocked_priority_weight))
            .then_with(|| a.id.cmp(&b.id))
    });

    let quick_wins: Vec<TriageRecommendation> = recommendations
        .iter()
        .filter(|r| r.quick_win)
        .cloned()
        .collect();

    let quick_ref = QuickRef {
        top_picks: recommendations
            .iter()
            .filter(|r| r.actionable)
            .take(config.top_picks)
            .map(|r| TopPick {
                id: r.id.clone(),
                title: r.title.clone(),
                score: r.score,
                reason: r.reasons.first().cloned(),
            })
            .collect(),
        open_count: active.len(),
        actionable_count: p1.actionable_ids().len(),
        blocked_count: p1.blocked_count(),
        in_progress_count: p1.in_progress_count,
        cycle_count: p2.as_ref().map_or(0, |p| p.cycles.len()),
    };

    debug!(
        recommendations = recommendations.len(),
        quick_wins = quick_wins.len(),
        blockers = blockers_to_clear.len(),
        phase2 = p2.is_some(),
        "triage computed"
    );

    TriageResult {
        meta: TriageMeta {
            generation: stats.generation().get(),
            issue_count: by_id.len(),
            phase2_complete: p2.is_some(),
            generated_at: now,
        },
        recommendations,
        quick_wins,
        blockers_to_clear,
        quick_ref,
    }
}

/// Analyze `issues` synchronously and triage with default settings.
#[must_use]
pub fn compute_triage_with_defaults(issues: &[Issue]) -> TriageResult {
    let stats = Analyzer::new(issues).analyze();
    compute_triage(issues, &stats, &TriageConfig::default(), Utc::now())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn reliable_height(p2: Option<&Phase2Stats>, id: &str) -> f64 {
    match p2.and_then(|p| p.critical_path.height(id)) {
        Some(Height::Reliable(h)) => h as f64,
        _ => 0.0,
    }
}

fn priority_weight(ids: &[String], by_id: &HashMap<&str, &Issue>) -> i64 {
    ids.iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .map(|issue| i64::from(MAX_PRIORITY + 1 - issue.clamped_priority()))
        .sum()
}

/// Estimate within the quick-win limit, or no estimate and no open
/// dependency of any kind.
fn is_low_effort(issue: &Issue, p1: &Phase1Stats, config: &TriageConfig) -> bool {
    match issue.estimate_minutes {
        Some(minutes) => minutes <= config.quick_win_max_estimate_minutes,
        None => !issue.deps().any(|dep| {
            dep.depends_on_id != issue.id
                && p1
                    .status(&dep.depends_on_id)
                    .is_some_and(|s| !s.is_closed())
        }),
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        f64::midpoint(sorted[mid - 1], sorted[mid])
    } else {
        sorted[mid]
    }
}

struct ReasonContext {
    pagerank: f64,
    height: f64,
    unblocks: usize,
    age_days: f64,
    blocked_by: usize,
    on_cycle: bool,
}

fn explain(
    issue: &Issue,
    breakdown: &ScoreBreakdown,
    config: &TriageConfig,
    ctx: &ReasonContext,
) -> Vec<String> {
    let mut reasons: Vec<String> = breakdown
        .contributions(&config.weights)
        .into_iter()
        .filter(|(_, contribution)| *contribution > 0.0)
        .map(|(component, _)| match component {
            Component::Priority => format!("Priority P{}", issue.clamped_priority()),
            Component::Impact => format!("High impact: PageRank {:.3}", ctx.pagerank),
            Component::CriticalPath => {
                format!("On critical path: {} step(s) of work wait below it", ctx.height)
            }
            Component::Unblocks => format!("Unblocks {} issue(s)", ctx.unblocks),
            Component::Age => format!("Not updated in {:.0} day(s)", ctx.age_days.floor()),
        })
        .collect();

    if ctx.blocked_by > 0 {
        reasons.push(format!("Blocked by {} open issue(s)", ctx.blocked_by));
    } else if issue.status == Status::Blocked {
        reasons.push("Marked as blocked".to_string());
    }
    if ctx.on_cycle {
        reasons.push("Part of a dependency cycle".to_string());
    }
    reasons
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
