//! End-to-end triage over small, hand-built issue sets.

use chrono::{Duration, TimeZone, Utc};
use knot_core::config::{TriageConfig, TriageWeights};
use knot_core::model::{DependencyKind, Issue, Status};
use knot_triage::analysis::{Analyzer, GraphStats, Phase1Stats, generate_insights};
use knot_triage::graph::RawGraph;
use knot_triage::triage::{compute_triage, compute_triage_with_defaults};

fn issue(id: &str) -> Issue {
    Issue::new(id, format!("Issue {id}"))
}

#[test]
fn urgent_blocker_ranks_first_and_must_be_cleared() {
    let result = compute_triage_with_defaults(&[
        issue("A").with_priority(0),
        issue("B").with_priority(3).blocked_by("A"),
    ]);

    let order: Vec<&str> = result.recommendations.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(order, vec!["A", "B"]);

    let blockers: Vec<&str> = result.blockers_to_clear.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(blockers, vec!["A"]);
    assert!(result.blockers_to_clear[0].actionable);
    assert_eq!(result.quick_ref.top_picks[0].id, "A");
}

#[test]
fn priority_weight_qualifies_blocker_when_count_is_too_low() {
    let issues = [
        issue("A"),
        issue("B").with_priority(0).blocked_by("A"),
        issue("C").with_priority(4),
        issue("D").with_priority(4).blocked_by("C"),
    ];
    let stats = Analyzer::new(&issues).analyze();
    let config = TriageConfig {
        blocker_min_unblocks: 2,
        blocker_min_priority_weight: 5,
        ..TriageConfig::default()
    };
    let result = compute_triage(&issues, &stats, &config, Utc::now());

    // A frees a P0 (weight 5); C frees a P4 (weight 1).
    let blockers: Vec<&str> = result.blockers_to_clear.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(blockers, vec!["A"]);
    assert!(!result.recommendation("C").expect("C").significant_blocker);
}

#[test]
fn shared_dependents_are_not_unblocked_by_one_blocker() {
    let result = compute_triage_with_defaults(&[
        issue("A"),
        issue("B"),
        issue("C").blocked_by("A").blocked_by("B"),
    ]);
    assert!(result.blockers_to_clear.is_empty());
    assert!(result.recommendation("A").expect("A").unblocks.is_empty());
}

#[test]
fn ties_break_by_priority_then_id() {
    let weights = TriageWeights {
        priority: 0.0,
        impact: 0.0,
        critical_path: 0.0,
        unblocks: 0.0,
        age: 1.0,
    };
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid date");
    let issues = [
        issue("c").with_priority(1).with_timestamps(at, at),
        issue("b").with_priority(2).with_timestamps(at, at),
        issue("a").with_priority(2).with_timestamps(at, at),
    ];
    let stats = Analyzer::new(&issues).analyze();
    let result = compute_triage(
        &issues,
        &stats,
        &TriageConfig {
            weights,
            ..TriageConfig::default()
        },
        at + Duration::days(3),
    );

    let order: Vec<&str> = result.recommendations.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
    assert_eq!(result.meta.generated_at, at + Duration::days(3));
}

#[test]
fn quick_wins_respect_effort_signal() {
    // Everything depends on "core"; "core" itself is cheap.
    let result = compute_triage_with_defaults(&[
        issue("core").with_estimate(20),
        issue("big").with_estimate(600).blocked_by("x"),
        issue("x"),
        issue("u1").blocked_by("core"),
        issue("u2").blocked_by("core"),
        issue("u3").depends_on("core", DependencyKind::Related),
    ]);
    let wins: Vec<&str> = result.quick_wins.iter().map(|r| r.id.as_str()).collect();
    assert!(wins.contains(&"core"), "{wins:?}");
    assert!(!wins.contains(&"big"));
    for win in &result.quick_wins {
        assert!(win.actionable);
        assert!(win.quick_win);
    }
}

#[test]
fn closed_blockers_release_their_dependents() {
    let result = compute_triage_with_defaults(&[
        issue("A").with_status(Status::Closed),
        issue("B").blocked_by("A"),
    ]);
    let b = result.recommendation("B").expect("B");
    assert!(b.actionable);
    assert!(b.blocked_by.is_empty());
    assert!(result.recommendation("A").is_none());
}

#[test]
fn triage_does_not_wait_for_pending_analysis() {
    let issues = [issue("A").with_priority(1), issue("B").with_priority(0).blocked_by("A")];
    let stats = GraphStats::new(Phase1Stats::compute(&RawGraph::from_issues(&issues)));
    let result = compute_triage(&issues, &stats, &TriageConfig::default(), Utc::now());

    assert!(!result.meta.phase2_complete);
    assert_eq!(result.recommendations.len(), 2);
    for rec in &result.recommendations {
        assert!(rec.breakdown.impact.abs() < f64::EPSILON);
        assert!(rec.breakdown.critical_path.abs() < f64::EPSILON);
    }
    // Phase 1 alone still knows who blocks whom.
    assert_eq!(result.recommendation("B").expect("B").blocked_by, vec!["A".to_string()]);
    assert_eq!(result.blockers_to_clear[0].id, "A");
}

#[test]
fn result_serializes_to_json() {
    let result = compute_triage_with_defaults(&[issue("A"), issue("B").blocked_by("A")]);
    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["recommendations"][0]["id"], "A");
    assert_eq!(json["meta"]["phase2_complete"], true);
}

#[test]
fn insights_rank_by_each_metric() {
    let issues = [
        issue("root"),
        issue("mid").blocked_by("root"),
        issue("leaf1").blocked_by("mid"),
        issue("leaf2").blocked_by("mid"),
    ];
    let stats = Analyzer::new(&issues).analyze();
    let insights = generate_insights(&stats, 2);

    assert_eq!(insights.important[0].id, "root");
    assert_eq!(insights.bottlenecks[0].id, "mid");
    assert_eq!(insights.keystones[0].id, "root");
    assert_eq!(insights.authorities[0].id, "mid");
    assert_eq!(insights.important.len(), 2);
    assert!(insights.cycles.is_empty());
}
