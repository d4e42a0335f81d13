//! Tallies of operation outcomes, keyed by error kind.

use std::collections::BTreeMap;

use concord_types::ErrorKind;

/// Counts successful and failed calls during a replay or a test run.
#[derive(Debug, Default, Clone)]
pub struct OutcomeStats {
    succeeded: u64,
    failed: BTreeMap<&'static str, u64>,
}

impl OutcomeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ok(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_err(&mut self, kind: ErrorKind) {
        *self.failed.entry(kind.as_str()).or_insert(0) += 1;
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    pub fn failed(&self) -> u64 {
        self.failed.values().sum()
    }

    pub fn failures_of(&self, kind: ErrorKind) -> u64 {
        self.failed.get(kind.as_str()).copied().unwrap_or(0)
    }

    /// One line per failure kind, in alphabetical order.
    pub fn summary(&self) -> String {
        let mut out = format!("{} ok, {} failed", self.succeeded, self.failed());
        for (kind, count) in &self.failed {
            out.push_str(&format!("\n  {kind}: {count}"));
        }
        out
    }
}
