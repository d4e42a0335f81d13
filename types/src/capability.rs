//! Capability traits: the seams between the core and its host.
//!
//! The core owns no clock, no ledger and no hash function of its own. The host
//! injects them through these traits, which keeps every component
//! deterministic and lets tests substitute nullable implementations.

use thiserror::Error;

use crate::address::Principal;
use crate::amount::Amount;
use crate::consensus::{ConsensusRecord, ContributionReport, RoundId};
use crate::hash::Digest;
use crate::time::Timestamp;

/// Source of logical time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Why a ledger transfer was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("account {account} holds {available}, needs {needed}")]
    Insufficient {
        account: Principal,
        needed: Amount,
        available: Amount,
    },

    #[error("balance overflow crediting {0}")]
    Overflow(Principal),

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Atomic debit/credit between principals.
///
/// A failed transfer must leave both balances untouched.
pub trait FundTransfer {
    fn balance(&self, account: &Principal) -> Amount;

    fn transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: Amount,
    ) -> Result<(), TransferError>;
}

/// Hashing used by the commit/reveal protocol.
pub trait CommitHasher {
    /// Commitment binding a value to its round, its operator and a salt.
    fn commitment(
        &self,
        round: &RoundId,
        operator: &Principal,
        salt: &[u8],
        value: &ContributionReport,
    ) -> Digest;

    /// Digest of a value alone, used to identify agreeing reveals.
    fn value_digest(&self, value: &ContributionReport) -> Digest;
}

/// Read-only view of the governance signer set.
pub trait MultiSig {
    fn is_signer(&self, principal: &Principal) -> bool;
    fn signer_count(&self) -> usize;
    fn threshold(&self) -> u32;
}

/// Read-only port onto finalized oracle consensus.
///
/// Records are numbered from 1 in finalization order; a sequence number of 0
/// means "nothing finalized yet".
pub trait Oracle {
    fn latest_seq(&self) -> u64;

    fn consensus(&self, seq: u64) -> Option<ConsensusRecord>;

    /// Up to `limit` records with sequence numbers strictly above `after`,
    /// in ascending order.
    fn consensus_after(&self, after: u64, limit: usize) -> Vec<ConsensusRecord>;
}
