//! Order-independent structural fingerprint of an issue set.
//!
//! The fingerprint covers, per issue, `(id, status, priority, dependency
//! list)`. Each issue is serialized to a canonical record with its
//! dependencies sorted, the records are sorted, and the sorted sequence is
//! hashed with BLAKE3. Reordering issues or their dependency entries never
//! changes the result; absent dependency entries are ignored.
//!
//! Duplicate ids resolve the way [`RawGraph::from_issues`](crate::graph::RawGraph::from_issues)
//! resolves them: the first occurrence is hashed, later ones are skipped.

use std::collections::HashSet;
use std::fmt;

use knot_core::model::Issue;

/// BLAKE3 digest identifying one structural version of an issue set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compute the fingerprint of `issues`.
    #[must_use]
    pub fn of(issues: &[Issue]) -> Self {
        let mut seen: HashSet<&str> = HashSet::with_capacity(issues.len());
        let mut records: Vec<Vec<u8>> = issues
            .iter()
            .filter(|issue| seen.insert(issue.id.as_str()))
            .map(canonical_record)
            .collect();
        records.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for record in &records {
            hasher.update(record);
            hasher.update(b"\x1e");
        }
        Self(*hasher.finalize().as_bytes())
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blake3:{}", blake3::Hash::from(self.0).to_hex())
    }
}

fn canonical_record(issue: &Issue) -> Vec<u8> {
    let mut deps: Vec<String> = issue
        .deps()
        .map(|dep| format!("{}\x00{}\x00{}", dep.issue_id, dep.depends_on_id, dep.kind))
        .collect();
    deps.sort_unstable();

    let mut record = format!("{}\x00{}\x00{}", issue.id, issue.status, issue.priority).into_bytes();
    for dep in deps {
        record.push(0x1f);
        record.extend_from_slice(dep.as_bytes());
    }
    record
}
