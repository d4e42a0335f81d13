//! Error taxonomy shared across crates.
//!
//! Every component has its own error enum; each maps onto one of these kinds
//! so that callers can react uniformly without matching component types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The class of a failed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the required role or signer status.
    Unauthorized,
    /// Operation is not valid for the current state-machine state.
    InvalidState,
    /// Unknown id or principal.
    NotFound,
    /// The record already exists.
    AlreadyExists,
    /// The signer already signed (or voted to cancel) this proposal.
    AlreadySigned,
    /// The operator already committed in this round.
    DuplicateCommit,
    /// The operator never committed in this round.
    NoCommit,
    /// Offered stake is below the minimum.
    InsufficientStake,
    /// An account balance cannot cover a transfer.
    InsufficientFunds,
    /// A direct-authority call exceeds the direct risk tier.
    TierExceedsDirectAuthority,
    /// The proposal timelock has not elapsed.
    TimelockActive,
    /// The deadline for this operation has passed.
    DeadlinePassed,
    /// A reveal does not hash to its commitment.
    HashMismatch,
    /// A claim would pay nothing.
    NothingToClaim,
    /// A governance-supplied parameter set is inconsistent.
    InvalidParameter,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidState => "invalid_state",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::AlreadySigned => "already_signed",
            Self::DuplicateCommit => "duplicate_commit",
            Self::NoCommit => "no_commit",
            Self::InsufficientStake => "insufficient_stake",
            Self::InsufficientFunds => "insufficient_funds",
            Self::TierExceedsDirectAuthority => "tier_exceeds_direct_authority",
            Self::TimelockActive => "timelock_active",
            Self::DeadlinePassed => "deadline_passed",
            Self::HashMismatch => "hash_mismatch",
            Self::NothingToClaim => "nothing_to_claim",
            Self::InvalidParameter => "invalid_parameter",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected parameter set.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid parameter `{name}`: {reason}")]
pub struct ParamError {
    pub name: &'static str,
    pub reason: String,
}

impl ParamError {
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }
}
