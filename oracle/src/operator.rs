//! Oracle operators: stake, reliability and admission status.

use concord_types::{Amount, Principal, Timestamp, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// Why an active operator stopped being active without leaving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeactivationReason {
    /// Reliability fell below the floor.
    LowReliability,
    /// Stake fell below the minimum (slashing or a parameter change).
    InsufficientStake,
}

/// How an operator left the network. Its stake has been refunded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Withdrawn,
    Rejected,
    Resigned,
    Removed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorStatus {
    /// Stake escrowed, awaiting governance approval.
    Applied,
    /// May open rounds and submit data.
    Active,
    /// Stake still escrowed; needs governance re-approval to submit again.
    Inactive(DeactivationReason),
    /// Left the network. May apply again.
    Exited(ExitReason),
}

/// A staked oracle operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleOperator {
    pub id: Principal,
    /// Stake currently held in escrow.
    pub stake: Amount,
    /// Exponentially weighted success ratio, in basis points.
    pub reliability_bps: u32,
    pub status: OperatorStatus,
    pub applied_at: Timestamp,
    pub admitted_at: Option<Timestamp>,
}

impl OracleOperator {
    pub fn is_active(&self) -> bool {
        self.status == OperatorStatus::Active
    }

    /// Whether stake is still escrowed for this operator.
    pub fn holds_stake(&self) -> bool {
        !matches!(self.status, OperatorStatus::Exited(_))
    }

    /// Fold one round's outcome into the reliability score.
    pub fn record_outcome(&mut self, success: bool, alpha_bps: u32) {
        self.reliability_bps = ewma(self.reliability_bps, success, alpha_bps);
    }
}

/// `old × (1 − α) + outcome × α`, where outcome is 100% on success and 0 otherwise.
pub fn ewma(old_bps: u32, success: bool, alpha_bps: u32) -> u32 {
    let alpha = alpha_bps.min(BPS_DENOMINATOR) as u64;
    let outcome = if success { BPS_DENOMINATOR as u64 } else { 0 };
    let keep = BPS_DENOMINATOR as u64 - alpha;
    ((old_bps as u64 * keep + outcome * alpha) / BPS_DENOMINATOR as u64) as u32
}
