use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub triage: TriageConfig,
}

impl ProjectConfig {
    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.triage.validate()
    }
}

/// Tuning for the phase 2 iterative algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_max_iter")]
    pub hits_max_iter: usize,
    #[serde(default = "default_max_iter")]
    pub eigenvector_max_iter: usize,
    /// Run the phase 2 algorithms on scoped threads.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            tolerance: default_tolerance(),
            max_iter: default_max_iter(),
            hits_max_iter: default_max_iter(),
            eigenvector_max_iter: default_max_iter(),
            parallel: default_true(),
        }
    }
}

impl AnalysisConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("analysis.damping", self.damping, 0.0, 1.0)?;
        check_range("analysis.tolerance", self.tolerance, 0.0, 1.0)?;
        check_nonzero("analysis.max_iter", self.max_iter)?;
        check_nonzero("analysis.hits_max_iter", self.hits_max_iter)?;
        check_nonzero("analysis.eigenvector_max_iter", self.eigenvector_max_iter)
    }
}

/// Weights of the composite triage formula:
///
/// `S(v) = priority*P + impact*PR + critical_path*CP + unblocks*U + age*A`
///
/// Weights are renormalized by their sum, so only their ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriageWeights {
    pub priority: f64,
    pub impact: f64,
    pub critical_path: f64,
    pub unblocks: f64,
    pub age: f64,
}

impl Default for TriageWeights {
    fn default() -> Self {
        Self {
            priority: 0.30,
            impact: 0.25,
            critical_path: 0.20,
            unblocks: 0.15,
            age: 0.10,
        }
    }
}

impl TriageWeights {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.priority + self.impact + self.critical_path + self.unblocks + self.age
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub weights: TriageWeights,
    /// Score multiplier for issues that still have an open blocker.
    #[serde(default = "default_blocked_penalty")]
    pub blocked_penalty: f64,
    /// Age (days since last update) at which the age component saturates.
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: f64,
    #[serde(default = "default_quick_win_max_estimate")]
    pub quick_win_max_estimate_minutes: u32,
    #[serde(default = "default_blocker_min_unblocks")]
    pub blocker_min_unblocks: usize,
    /// Sum of `MAX_PRIORITY + 1 - priority` over freed issues.
    #[serde(default = "default_blocker_min_priority_weight")]
    pub blocker_min_priority_weight: i64,
    #[serde(default = "default_top_picks")]
    pub top_picks: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            weights: TriageWeights::default(),
            blocked_penalty: default_blocked_penalty(),
            stale_after_days: default_stale_after_days(),
            quick_win_max_estimate_minutes: default_quick_win_max_estimate(),
            blocker_min_unblocks: default_blocker_min_unblocks(),
            blocker_min_priority_weight: default_blocker_min_priority_weight(),
            top_picks: default_top_picks(),
        }
    }
}

impl TriageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (key, value) in [
            ("triage.weights.priority", w.priority),
            ("triage.weights.impact", w.impact),
            ("triage.weights.critical_path", w.critical_path),
            ("triage.weights.unblocks", w.unblocks),
            ("triage.weights.age", w.age),
        ] {
            check_range(key, value, 0.0, 1.0)?;
        }
        if w.total() <= f64::EPSILON {
            return Err(ConfigError::ZeroWeights);
        }
        check_range("triage.blocked_penalty", self.blocked_penalty, 0.0, 1.0)?;
        check_range("triage.stale_after_days", self.stale_after_days, 1.0, 3650.0)?;
        check_nonzero("triage.blocker_min_unblocks", self.blocker_min_unblocks)?;
        check_nonzero("triage.top_picks", self.top_picks)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_damping() -> f64 {
    0.85
}

const fn default_tolerance() -> f64 {
    1e-6
}

const fn default_max_iter() -> usize {
    100
}

const fn default_blocked_penalty() -> f64 {
    0.5
}

const fn default_stale_after_days() -> f64 {
    30.0
}

const fn default_quick_win_max_estimate() -> u32 {
    60
}

const fn default_blocker_min_unblocks() -> usize {
    1
}

const fn default_blocker_min_priority_weight() -> i64 {
    5
}

const fn default_top_picks() -> usize {
    3
}

fn check_range(key: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            min,
            max,
            value,
        })
    }
}

const fn check_nonzero(key: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { key })
    } else {
        Ok(())
    }
}

/// Path of the project config file under `project_root`.
#[must_use]
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(".knot/config.toml")
}

/// Load `.knot/config.toml`, falling back to defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        debug!(path = %path.display(), "no project config, using defaults");
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;

    Ok(config)
}
