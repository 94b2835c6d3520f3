use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use knot_core::config::{AnalysisConfig, TriageConfig};
use knot_core::model::{DependencyKind, Issue};
use knot_triage::analysis::{Analyzer, compute_phase2};
use knot_triage::graph::RawGraph;
use knot_triage::triage::compute_triage;

struct Tier {
    name: &'static str,
    layers: usize,
    width: usize,
}

const TIERS: [Tier; 3] = [
    Tier {
        name: "small",
        layers: 5,
        width: 20,
    },
    Tier {
        name: "medium",
        layers: 10,
        width: 100,
    },
    Tier {
        name: "large",
        layers: 20,
        width: 250,
    },
];

/// Layered DAG: each issue blocks two issues in the next layer, with a
/// sprinkling of non-blocking `related` links.
fn layered(tier: &Tier) -> Vec<Issue> {
    let mut issues = Vec::with_capacity(tier.layers * tier.width);
    for layer in 0..tier.layers {
        for slot in 0..tier.width {
            let mut issue = Issue::new(format!("L{layer}-{slot}"), format!("Layer {layer} slot {slot}"))
                .with_priority(i32::try_from(slot % 5).unwrap_or(2));
            if layer > 0 {
                issue = issue
                    .blocked_by(format!("L{}-{slot}", layer - 1))
                    .blocked_by(format!("L{}-{}", layer - 1, (slot + 1) % tier.width));
            }
            if slot % 7 == 0 {
                issue = issue.depends_on(format!("L0-{}", slot / 7), DependencyKind::Related);
            }
            issues.push(issue);
        }
    }
    issues
}

fn bench_triage(c: &mut Criterion) {
    let mut group = c.benchmark_group("triage.tiered");
    group.sample_size(20);

    for tier in &TIERS {
        let issues = layered(tier);
        let raw = RawGraph::from_issues(&issues);
        group.throughput(Throughput::Elements(issues.len() as u64));

        group.bench_with_input(BenchmarkId::new("build", tier.name), &issues, |b, issues| {
            b.iter(|| black_box(RawGraph::from_issues(issues)));
        });

        let sequential = AnalysisConfig {
            parallel: false,
            ..AnalysisConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("phase2.sequential", tier.name), &raw, |b, raw| {
            b.iter(|| black_box(compute_phase2(raw, &sequential)));
        });

        let parallel = AnalysisConfig::default();
        group.bench_with_input(BenchmarkId::new("phase2.parallel", tier.name), &raw, |b, raw| {
            b.iter(|| black_box(compute_phase2(raw, &parallel)));
        });

        let stats = Analyzer::new(&issues).analyze();
        let config = TriageConfig::default();
        let now = Utc::now();
        group.bench_with_input(BenchmarkId::new("triage", tier.name), &issues, |b, issues| {
            b.iter(|| black_box(compute_triage(issues, &stats, &config, now)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_triage);
criterion_main!(benches);
