//! Oracle round identifiers, reported values and finalized consensus.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::address::Principal;
use crate::hash::Digest;
use crate::time::Timestamp;

/// Identifies one oracle data round: an external subject and an epoch.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId {
    pub subject: String,
    pub epoch: u64,
}

impl RoundId {
    pub fn new(subject: impl Into<String>, epoch: u64) -> Self {
        Self {
            subject: subject.into(),
            epoch,
        }
    }

    /// Length-prefixed encoding used as hash input.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.subject.len() + 12);
        push_str(&mut out, &self.subject);
        out.extend_from_slice(&self.epoch.to_be_bytes());
        out
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.subject, self.epoch)
    }
}

/// Contribution points per contributor, as reported by an oracle operator.
///
/// Backed by an ordered map so that two reports with the same entries encode
/// identically regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionReport(BTreeMap<Principal, u64>);

impl ContributionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, contributor: impl Into<Principal>, points: u64) -> Self {
        self.0.insert(contributor.into(), points);
        self
    }

    pub fn insert(&mut self, contributor: Principal, points: u64) {
        self.0.insert(contributor, points);
    }

    pub fn points(&self, contributor: &Principal) -> u64 {
        self.0.get(contributor).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Principal, u64)> {
        self.0.iter().map(|(p, n)| (p, *n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry count, then each contributor (length-prefixed) and its points,
    /// in ascending contributor order.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.0.len() as u32).to_be_bytes());
        for (contributor, points) in &self.0 {
            push_str(&mut out, contributor.as_str());
            out.extend_from_slice(&points.to_be_bytes());
        }
        out
    }
}

impl FromIterator<(Principal, u64)> for ContributionReport {
    fn from_iter<I: IntoIterator<Item = (Principal, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The immutable outcome of a finalized oracle round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    /// Finalization order, starting at 1.
    pub seq: u64,
    pub round: RoundId,
    pub value: ContributionReport,
    pub value_digest: Digest,
    /// Operators whose reveal matched the agreed value, sorted.
    pub contributors: Vec<Principal>,
    pub finalized_at: Timestamp,
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_ignore_insertion_order() {
        let a = ContributionReport::new().with("alice", 3).with("bob", 5);
        let b = ContributionReport::new().with("bob", 5).with("alice", 3);
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn canonical_bytes_are_unambiguous() {
        // "ab"+"c" must not collide with "a"+"bc".
        let a = ContributionReport::new().with("ab", 1).with("c", 1);
        let b = ContributionReport::new().with("a", 1).with("bc", 1);
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn round_display() {
        assert_eq!(RoundId::new("commits", 7).to_string(), "commits#7");
    }
}
