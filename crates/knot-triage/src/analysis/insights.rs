//! Ranked top-N views over a published analysis.

use serde::{Deserialize, Serialize};

use crate::analysis::store::GraphStats;
use crate::metrics::top_n;

/// One ranked entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightItem {
    pub id: String,
    pub value: f64,
}

/// Top-N lists per metric. Lists are empty until Phase 2 is published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Highest betweenness.
    pub bottlenecks: Vec<InsightItem>,
    /// Tallest reliable critical-path height.
    pub keystones: Vec<InsightItem>,
    /// Highest eigenvector centrality.
    pub influencers: Vec<InsightItem>,
    pub hubs: Vec<InsightItem>,
    pub authorities: Vec<InsightItem>,
    /// Highest PageRank.
    pub important: Vec<InsightItem>,
    /// Longest reliable blocking chain, top blocker first.
    pub critical_path: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub density: f64,
    pub phase2_complete: bool,
}

/// Build [`Insights`] with at most `limit` entries per list. Ties are
/// broken by issue ID. Never blocks.
#[must_use]
pub fn generate_insights(stats: &GraphStats, limit: usize) -> Insights {
    let density = stats.phase1().density;
    let Some(p2) = stats.phase2() else {
        return Insights {
            density,
            ..Insights::default()
        };
    };

    let items = |pairs: Vec<(String, f64)>| -> Vec<InsightItem> {
        pairs
            .into_iter()
            .map(|(id, value)| InsightItem { id, value })
            .collect()
    };

    let mut heights = p2.critical_path_scores();
    heights.retain(|_, h| *h >= 0.0);

    Insights {
        bottlenecks: items(top_n(&p2.betweenness, limit)),
        keystones: items(top_n(&heights, limit)),
        influencers: items(top_n(&p2.eigenvector, limit)),
        hubs: items(top_n(&p2.hubs, limit)),
        authorities: items(top_n(&p2.authorities, limit)),
        important: items(top_n(&p2.pagerank, limit)),
        critical_path: p2.critical_path.critical_path.clone(),
        cycles: p2.cycles.clone(),
        density,
        phase2_complete: true,
    }
}
