//! Governance proposals and their lifecycle.

use concord_types::{Principal, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::action::Action;

/// Lifecycle of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Collecting signatures.
    Pending,
    /// Threshold reached; executable once the timelock elapses.
    Approved,
    /// The action was applied. Terminal.
    Executed,
    /// Never reached threshold before its TTL. Terminal.
    Expired,
    /// Withdrawn by the proposer or by a cancel quorum. Terminal.
    Cancelled,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Expired | Self::Cancelled)
    }
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub action: Action,
    pub proposer: Principal,
    pub created_at: Timestamp,
    /// Signers who approved. The proposer signs on creation.
    pub signatures: BTreeSet<Principal>,
    /// Signatures required, captured at creation.
    pub required: u32,
    /// Whether `required` is the supermajority level.
    pub supermajority: bool,
    /// Creation time plus the timelock captured at creation.
    pub earliest_execution: Timestamp,
    /// After this point a pending proposal no longer accepts signatures.
    pub expires_at: Timestamp,
    pub status: ProposalStatus,
    pub cancel_votes: BTreeSet<Principal>,
    pub executed_at: Option<Timestamp>,
    /// When the proposal was cancelled or expired.
    pub closed_at: Option<Timestamp>,
}

impl Proposal {
    pub fn signature_count(&self) -> u32 {
        self.signatures.len() as u32
    }

    pub fn has_threshold(&self) -> bool {
        self.signature_count() >= self.required
    }

    /// A pending proposal whose TTL has elapsed, whether or not
    /// `expire_stale` has swept it yet.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        self.status == ProposalStatus::Pending && now >= self.expires_at
    }

    /// Still live: pending within its TTL, or approved and awaiting execution.
    pub fn is_active(&self, now: Timestamp) -> bool {
        match self.status {
            ProposalStatus::Pending => now < self.expires_at,
            ProposalStatus::Approved => true,
            _ => false,
        }
    }
}

/// Result of a cancel call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelOutcome {
    Cancelled,
    /// The vote counted but the cancel quorum is not yet reached.
    VoteRecorded { votes: u32, needed: u32 },
}

/// Membership record for a governance signer.
///
/// Removed signers are kept, inactive, for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRecord {
    pub active: bool,
    pub added_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}
