use knot_core::config::TriageWeights;
use knot_core::model::MAX_PRIORITY;
use serde::{Deserialize, Serialize};

/// Raw per-issue inputs to the composite triage score.
///
/// Metric fields are expected in `[0, 1]` and are clamped by
/// [`ScoreBreakdown::from_inputs`]. Callers pre-normalize per-metric
/// vectors with [`normalize_metric`] or [`normalize_by_max`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentInputs {
    /// Declared priority, `0` most urgent.
    pub priority: i32,
    /// Normalized PageRank.
    pub impact: f64,
    /// Normalized critical-path height; unreliable heights count as 0.
    pub critical_path: f64,
    /// Normalized number of issues freed if this one closes.
    pub unblocks: f64,
    /// Days since the issue was last updated.
    pub age_days: f64,
}

/// One scoring dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Priority,
    Impact,
    CriticalPath,
    Unblocks,
    Age,
}

impl Component {
    pub const ALL: [Self; 5] = [
        Self::Priority,
        Self::Impact,
        Self::CriticalPath,
        Self::Unblocks,
        Self::Age,
    ];

    #[must_use]
    pub const fn weight(self, weights: &TriageWeights) -> f64 {
        match self {
            Self::Priority => weights.priority,
            Self::Impact => weights.impact,
            Self::CriticalPath => weights.critical_path,
            Self::Unblocks => weights.unblocks,
            Self::Age => weights.age,
        }
    }
}

/// Per-component values, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub priority: f64,
    pub impact: f64,
    pub critical_path: f64,
    pub unblocks: f64,
    pub age: f64,
}

impl ScoreBreakdown {
    /// Map raw inputs to unit-range component values. Age saturates at
    /// `stale_after_days`.
    #[must_use]
    pub fn from_inputs(inputs: &ComponentInputs, stale_after_days: f64) -> Self {
        Self {
            priority: priority_component(inputs.priority),
            impact: normalize_unit(inputs.impact),
            critical_path: normalize_unit(inputs.critical_path),
            unblocks: normalize_unit(inputs.unblocks),
            age: age_component(inputs.age_days, stale_after_days),
        }
    }

    #[must_use]
    pub const fn get(&self, component: Component) -> f64 {
        match component {
            Component::Priority => self.priority,
            Component::Impact => self.impact,
            Component::CriticalPath => self.critical_path,
            Component::Unblocks => self.unblocks,
            Component::Age => self.age,
        }
    }

    /// Weighted contribution of each component, largest first. Ties keep
    /// [`Component::ALL`] order.
    #[must_use]
    pub fn contributions(&self, weights: &TriageWeights) -> Vec<(Component, f64)> {
        let total = weights.total();
        let mut out: Vec<(Component, f64)> = Component::ALL
            .iter()
            .map(|&c| {
                let share = if total > 0.0 { c.weight(weights) / total } else { 0.0 };
                (c, share * self.get(c))
            })
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }
}

/// Weighted mean of the components, in `[0, 1]`.
///
/// `P(v) = Σ wᵢ·cᵢ / Σ wᵢ`
#[must_use]
pub fn composite_score(breakdown: &ScoreBreakdown, weights: &TriageWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    let sum: f64 = Component::ALL
        .iter()
        .map(|&c| c.weight(weights) * breakdown.get(c))
        .sum();
    normalize_unit(sum / total)
}

/// Min-max normalization that maps raw metric values to `[0, 1]`.
///
/// If all values are equal (including a single-element slice), all outputs are
/// `0.0`.
#[must_use]
pub fn normalize_metric(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range.abs() <= f64::EPSILON {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|&value| normalize_unit((value - min) / range))
        .collect()
}

/// Divide by the largest value. Negative values map to 0; an all-zero
/// input stays zero.
#[must_use]
pub fn normalize_by_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 || !max.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&v| normalize_unit(v / max)).collect()
}

fn normalize_unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    value.clamp(0.0, 1.0)
}

/// `0 → 1.0`, `MAX_PRIORITY → 0.0`; out-of-range priorities clamp.
fn priority_component(priority: i32) -> f64 {
    let p = priority.clamp(0, MAX_PRIORITY);
    f64::from(MAX_PRIORITY - p) / f64::from(MAX_PRIORITY)
}

fn age_component(age_days: f64, stale_after_days: f64) -> f64 {
    if !age_days.is_finite() || stale_after_days <= 0.0 {
        return 0.0;
    }

    normalize_unit(age_days.max(0.0) / stale_after_days)
}
