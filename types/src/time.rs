//! Logical time used throughout the core.
//!
//! Time is a monotonic counter supplied by the host environment (block height
//! or equivalent). The core never reads a wall clock, so every deadline check
//! is deterministic and replayable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in logical time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Time zero.
    pub const GENESIS: Self = Self(0);

    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The point `ticks` after this one, saturating at the end of time.
    pub fn after(&self, ticks: u64) -> Self {
        Self(self.0.saturating_add(ticks))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
