use concord_types::{Amount, Principal, Timestamp};
use serde::{Deserialize, Serialize};

/// Per-contributor claim progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub contributor: Principal,
    /// Cumulative rewards paid. Never decreases.
    pub total_claimed: Amount,
    /// Sequence number of the last consensus record scanned; 0 before the
    /// first claim.
    pub last_claimed_round: u64,
    pub last_claimed_at: Option<Timestamp>,
}

impl ClaimRecord {
    pub fn new(contributor: Principal) -> Self {
        Self {
            contributor,
            total_claimed: Amount::ZERO,
            last_claimed_round: 0,
            last_claimed_at: None,
        }
    }
}

/// What a successful claim paid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub amount: Amount,
    /// Records that paid this contributor something.
    pub rewarded_records: usize,
    /// The contributor's `last_claimed_round` after the claim.
    pub through_seq: u64,
}
