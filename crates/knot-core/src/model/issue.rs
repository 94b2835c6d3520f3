use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ErrorCode;

/// Lowest-urgency priority value used when clamping caller input.
pub const MAX_PRIORITY: i32 = 4;

/// The four lifecycle states of an issue.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
        }
    }

    /// Return `true` once the issue no longer holds anything up.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Kind of link between two issues.
///
/// Only [`DependencyKind::Blocks`] carries blocking semantics. The other
/// kinds still contribute edges to centrality metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Blocks,
    Related,
    ParentChild,
    DiscoveredFrom,
}

impl DependencyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Related => "related",
            Self::ParentChild => "parent_child",
            Self::DiscoveredFrom => "discovered_from",
        }
    }

    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Blocks)
    }
}

/// A directed link: `issue_id` depends on `depends_on_id`.
///
/// For [`DependencyKind::Blocks`] this reads "`depends_on_id` blocks
/// `issue_id`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub issue_id: String,
    pub depends_on_id: String,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(
        issue_id: impl Into<String>,
        depends_on_id: impl Into<String>,
        kind: DependencyKind,
    ) -> Self {
        Self {
            issue_id: issue_id.into(),
            depends_on_id: depends_on_id.into(),
            kind,
        }
    }
}

/// A unit of work as supplied by the loader.
///
/// The dependency list may contain `None` entries (loader placeholders for
/// links it could not decode); consumers skip them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Status,
    /// Lower is more urgent; `0` is the most urgent.
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optional effort estimate in minutes.
    #[serde(default)]
    pub estimate_minutes: Option<u32>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Option<Dependency>>,
}

const fn default_priority() -> i32 {
    2
}

impl Issue {
    /// Create an open, priority-2 issue stamped with the current time.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            status: Status::Open,
            priority: default_priority(),
            created_at: now,
            updated_at: now,
            estimate_minutes: None,
            labels: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimate_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Add a dependency of this issue on `depends_on_id`.
    #[must_use]
    pub fn depends_on(mut self, depends_on_id: impl Into<String>, kind: DependencyKind) -> Self {
        let dep = Dependency::new(self.id.clone(), depends_on_id, kind);
        self.dependencies.push(Some(dep));
        self
    }

    /// Shorthand for a [`DependencyKind::Blocks`] dependency.
    #[must_use]
    pub fn blocked_by(self, blocker_id: impl Into<String>) -> Self {
        self.depends_on(blocker_id, DependencyKind::Blocks)
    }

    /// Iterate the present dependency entries, skipping absent ones.
    pub fn deps(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().flatten()
    }

    /// Iterate ids this issue is blocked by (regardless of their status).
    pub fn blocker_ids(&self) -> impl Iterator<Item = &str> {
        self.deps()
            .filter(|dep| dep.kind.is_blocking())
            .map(|dep| dep.depends_on_id.as_str())
    }

    /// Priority clamped into `0..=MAX_PRIORITY`.
    #[must_use]
    pub fn clamped_priority(&self) -> i32 {
        self.priority.clamp(0, MAX_PRIORITY)
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl ParseEnumError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidEnumValue
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for DependencyKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "blocks" => Ok(Self::Blocks),
            "related" => Ok(Self::Related),
            "parent_child" => Ok(Self::ParentChild),
            "discovered_from" => Ok(Self::DiscoveredFrom),
            _ => Err(ParseEnumError {
                expected: "dependency kind",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn status_parses_with_dashes_and_case() {
        assert_eq!("In-Progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!(" closed ".parse::<Status>(), Ok(Status::Closed));
        let err = "doing".parse::<Status>().expect_err("unknown status");
        assert_eq!(err.to_string(), "invalid status: 'doing'");
        assert_eq!(err.code().code(), "E2005");
    }

    #[test]
    fn dependency_kind_roundtrips_through_display() {
        for kind in [
            DependencyKind::Blocks,
            DependencyKind::Related,
            DependencyKind::ParentChild,
            DependencyKind::DiscoveredFrom,
        ] {
            assert_eq!(kind.to_string().parse::<DependencyKind>(), Ok(kind));
        }
    }

    #[test]
    fn only_blocks_is_blocking() {
        assert!(DependencyKind::Blocks.is_blocking());
        assert!(!DependencyKind::Related.is_blocking());
        assert!(!DependencyKind::ParentChild.is_blocking());
    }

    #[test]
    fn deps_skips_absent_entries() {
        let mut issue = Issue::new("kn-2", "second").blocked_by("kn-1");
        issue.dependencies.push(None);
        issue = issue.depends_on("kn-3", DependencyKind::Related);

        let targets: Vec<&str> = issue.deps().map(|d| d.depends_on_id.as_str()).collect();
        assert_eq!(targets, vec!["kn-1", "kn-3"]);
        assert_eq!(issue.blocker_ids().collect::<Vec<_>>(), vec!["kn-1"]);
    }

    #[test]
    fn issue_deserializes_with_defaults_and_null_dependency() {
        let json = r#"{
            "id": "kn-9",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-02T00:00:00Z",
            "dependencies": [null, {"issue_id": "kn-9", "depends_on_id": "kn-1", "kind": "blocks"}]
        }"#;
        let issue: Issue = serde_json::from_str(json).expect("parse issue");
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.priority, 2);
        assert_eq!(issue.dependencies.len(), 2);
        assert!(issue.dependencies[0].is_none());
        assert_eq!(issue.blocker_ids().collect::<Vec<_>>(), vec!["kn-1"]);
    }

    #[test]
    fn clamped_priority_stays_in_range() {
        assert_eq!(Issue::new("a", "").with_priority(-3).clamped_priority(), 0);
        assert_eq!(Issue::new("a", "").with_priority(9).clamped_priority(), MAX_PRIORITY);
    }

    proptest! {
        #[test]
        fn clamped_priority_is_always_valid(priority in any::<i32>()) {
            let clamped = Issue::new("p", "").with_priority(priority).clamped_priority();
            prop_assert!((0..=MAX_PRIORITY).contains(&clamped));
            if (0..=MAX_PRIORITY).contains(&priority) {
                prop_assert_eq!(clamped, priority);
            }
        }

        #[test]
        fn status_parse_ignores_case_and_padding(idx in 0_usize..4, upper in any::<bool>()) {
            let status = [Status::Open, Status::InProgress, Status::Blocked, Status::Closed][idx];
            let text = if upper {
                status.as_str().to_ascii_uppercase().replace('_', "-")
            } else {
                format!("  {status} ")
            };
            prop_assert_eq!(text.parse::<Status>(), Ok(status));
        }
    }
}
