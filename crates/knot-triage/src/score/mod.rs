//! Composite triage scoring.
//!
//! Turns per-issue metric values into one comparable number in `[0, 1]`
//! plus a per-component [`ScoreBreakdown`] used to explain it.

pub mod composite;

pub use composite::{
    Component, ComponentInputs, ScoreBreakdown, composite_score, normalize_by_max,
    normalize_metric,
};
