#![forbid(unsafe_code)]
//! knot-core library.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for I/O-facing return types and
//!   `thiserror` enums for typed validation failures.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;

pub use config::{AnalysisConfig, ProjectConfig, TriageConfig, TriageWeights};
pub use error::{ConfigError, ErrorCode};
pub use model::{Dependency, DependencyKind, Issue, Status};
