//! Digests of oracle commitments and revealed values.
//!
//! A commitment binds an operator to a value before the reveal phase; the
//! value digest keys the stake tally and is stored in every consensus record.
//! Ordering is byte-lexicographic: when two candidate values tie on stake and
//! operator count, the smaller digest wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte Blake2b output: a commitment or a value digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Placeholder for records built outside a round, e.g. in fixtures.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// Logs carry only the leading bytes.
impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
