//! Issue data model shared by the analytics engine and its callers.

pub mod issue;

pub use issue::{Dependency, DependencyKind, Issue, MAX_PRIORITY, ParseEnumError, Status};
