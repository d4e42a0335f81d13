//! Governance-tunable parameters for every component.
//!
//! Each parameter set is changed only by a governance-executed action, and
//! every update is validated before it takes effect. Defaults are the values a
//! fresh deployment starts with.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::ParamError;

/// Denominator for every basis-point ratio (10000 = 100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

// ── Governance ───────────────────────────────────────────────────────────

/// Multi-signature governance policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    /// Signatures required to approve an ordinary proposal.
    pub threshold: u32,

    /// Signatures required for supermajority-class actions
    /// (emergency pause, governance params, signer removal, critical spends).
    pub supermajority: u32,

    /// Logical time between creation and earliest execution.
    /// Default: 144 (one day of blocks).
    pub timelock: u64,

    /// Logical time after which an unapproved proposal expires.
    /// Default: 1008 (one week of blocks).
    pub proposal_ttl: u64,

    /// Distinct signer cancel-votes needed to cancel a proposal.
    pub cancel_quorum: u32,

    /// Whether a proposer may cancel their own pending proposal alone.
    pub proposer_may_cancel: bool,

    /// Longest emergency pause a single action may impose.
    pub max_pause_duration: u64,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            threshold: 3,
            supermajority: 4,
            timelock: 144,
            proposal_ttl: 1008,
            cancel_quorum: 2,
            proposer_may_cancel: true,
            max_pause_duration: 1008,
        }
    }
}

impl GovernanceParams {
    /// Validate against the number of active signers.
    pub fn validate(&self, signer_count: usize) -> Result<(), ParamError> {
        let signers = signer_count as u64;
        if self.threshold == 0 {
            return Err(ParamError::new("threshold", "must be at least 1"));
        }
        if self.supermajority < self.threshold {
            return Err(ParamError::new(
                "supermajority",
                format!(
                    "{} is below the threshold {}",
                    self.supermajority, self.threshold
                ),
            ));
        }
        if self.supermajority as u64 > signers {
            return Err(ParamError::new(
                "supermajority",
                format!(
                    "{} exceeds the signer count {}",
                    self.supermajority, signer_count
                ),
            ));
        }
        if self.cancel_quorum == 0 || self.cancel_quorum as u64 > signers {
            return Err(ParamError::new(
                "cancel_quorum",
                format!("must be between 1 and {signer_count}"),
            ));
        }
        if self.threshold > 1 && self.cancel_quorum >= self.threshold {
            return Err(ParamError::new(
                "cancel_quorum",
                format!(
                    "{} must be below the threshold {}",
                    self.cancel_quorum, self.threshold
                ),
            ));
        }
        if self.proposal_ttl == 0 {
            return Err(ParamError::new("proposal_ttl", "must be positive"));
        }
        Ok(())
    }

    /// The smallest signer set these parameters can operate with.
    pub fn min_signers(&self) -> usize {
        self.threshold.max(self.supermajority).max(self.cancel_quorum) as usize
    }
}

// ── Oracle ───────────────────────────────────────────────────────────────

/// Oracle network economics and round timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleParams {
    /// Stake an operator must escrow to apply and to stay active.
    pub min_stake: Amount,

    /// Length of the commit phase.
    pub commit_duration: u64,

    /// Length of the reveal phase.
    pub reveal_duration: u64,

    /// Share of revealed stake the winning value needs. Must exceed 50%.
    /// Default: 6700 (67%).
    pub consensus_threshold_bps: u32,

    /// Share of committed stake that must reveal for a round to finalize.
    pub reveal_quorum_bps: u32,

    /// Minimum number of reveals for a round to finalize.
    pub min_reveals: u32,

    /// EWMA weight for ordinary reliability updates.
    pub reliability_alpha_bps: u32,

    /// EWMA weight applied when a committed operator never reveals.
    pub no_reveal_alpha_bps: u32,

    /// Reliability below which an operator is deactivated.
    pub reliability_floor_bps: u32,

    /// Reliability assigned on admission.
    pub initial_reliability_bps: u32,

    /// Stake slashed from a committed operator that never reveals.
    pub no_reveal_penalty: Amount,

    /// Required ratio of slashing penalty to a round's reward budget.
    /// Default: 15000 (1.5x).
    pub security_ratio_bps: u32,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            min_stake: Amount::new(10_000),
            commit_duration: 60,
            reveal_duration: 60,
            consensus_threshold_bps: 6_700,
            reveal_quorum_bps: 5_000,
            min_reveals: 2,
            reliability_alpha_bps: 1_000,
            no_reveal_alpha_bps: 3_000,
            reliability_floor_bps: 3_000,
            initial_reliability_bps: 8_000,
            no_reveal_penalty: Amount::new(2_000),
            security_ratio_bps: 15_000,
        }
    }
}

impl OracleParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.min_stake.is_zero() {
            return Err(ParamError::new("min_stake", "must be positive"));
        }
        if self.commit_duration == 0 || self.reveal_duration == 0 {
            return Err(ParamError::new("phase duration", "must be positive"));
        }
        if self.consensus_threshold_bps <= BPS_DENOMINATOR / 2
            || self.consensus_threshold_bps > BPS_DENOMINATOR
        {
            return Err(ParamError::new(
                "consensus_threshold_bps",
                "must be a strict majority and at most 10000",
            ));
        }
        if self.reveal_quorum_bps > BPS_DENOMINATOR {
            return Err(ParamError::new("reveal_quorum_bps", "must be at most 10000"));
        }
        if self.min_reveals == 0 {
            return Err(ParamError::new("min_reveals", "must be at least 1"));
        }
        if self.reliability_alpha_bps == 0 || self.reliability_alpha_bps > BPS_DENOMINATOR {
            return Err(ParamError::new(
                "reliability_alpha_bps",
                "must be between 1 and 10000",
            ));
        }
        if self.no_reveal_alpha_bps < self.reliability_alpha_bps
            || self.no_reveal_alpha_bps > BPS_DENOMINATOR
        {
            return Err(ParamError::new(
                "no_reveal_alpha_bps",
                "must be at least reliability_alpha_bps and at most 10000",
            ));
        }
        if self.initial_reliability_bps > BPS_DENOMINATOR
            || self.initial_reliability_bps <= self.reliability_floor_bps
        {
            return Err(ParamError::new(
                "initial_reliability_bps",
                "must lie above the floor and at most 10000",
            ));
        }
        if self.no_reveal_penalty.is_zero() || self.no_reveal_penalty > self.min_stake {
            return Err(ParamError::new(
                "no_reveal_penalty",
                "must be positive and no larger than min_stake",
            ));
        }
        Ok(())
    }

    /// Total length of a round from opening to the reveal deadline.
    pub fn round_length(&self) -> u64 {
        self.commit_duration.saturating_add(self.reveal_duration)
    }
}

// ── Rewards ──────────────────────────────────────────────────────────────

/// Shape of the per-contributor reward function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Reward grows linearly with reported points.
    Linear,
    /// Reward grows with the integer square root of reported points.
    SquareRoot,
}

/// Reward function applied to each finalized consensus record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardCurve {
    pub kind: CurveKind,
    /// Reward per unit of curve output.
    pub per_point: Amount,
    /// Ceiling for one contributor in one record.
    pub cap_per_contributor: Amount,
    /// Ceiling for the whole record; larger totals are scaled pro rata.
    pub round_budget: Amount,
}

impl Default for RewardCurve {
    fn default() -> Self {
        Self {
            kind: CurveKind::Linear,
            per_point: Amount::new(1),
            cap_per_contributor: Amount::new(500),
            round_budget: Amount::new(1_000),
        }
    }
}

impl RewardCurve {
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.cap_per_contributor.is_zero() {
            return Err(ParamError::new("cap_per_contributor", "must be positive"));
        }
        if self.round_budget.is_zero() {
            return Err(ParamError::new("round_budget", "must be positive"));
        }
        Ok(())
    }

    /// Unscaled reward for a contributor reporting `points`.
    pub fn raw_reward(&self, points: u64) -> Amount {
        let units = match self.kind {
            CurveKind::Linear => points as u128,
            CurveKind::SquareRoot => isqrt(points) as u128,
        };
        let reward = Amount::new(units.saturating_mul(self.per_point.raw()));
        reward.min(self.cap_per_contributor)
    }
}

/// Floor of the square root, by Newton iteration.
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = x / 2 + x % 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Check that slashing a non-revealer always costs more than the most a
/// single round can pay out, scaled by the governance security ratio.
pub fn check_economic_security(
    oracle: &OracleParams,
    curve: &RewardCurve,
) -> Result<(), ParamError> {
    let penalty = oracle
        .no_reveal_penalty
        .raw()
        .saturating_mul(BPS_DENOMINATOR as u128);
    let exposure = curve
        .round_budget
        .raw()
        .saturating_mul(oracle.security_ratio_bps as u128);
    if penalty < exposure {
        return Err(ParamError::new(
            "no_reveal_penalty",
            format!(
                "penalty {} is below round budget {} x {} bps",
                oracle.no_reveal_penalty, curve.round_budget, oracle.security_ratio_bps
            ),
        ));
    }
    Ok(())
}

// ── Treasury ─────────────────────────────────────────────────────────────

/// Risk bracket of a disbursement, by amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Payable by a direct-authority signer.
    Direct,
    /// Requires governance execution.
    Elevated,
    /// Requires governance execution with a supermajority.
    Critical,
}

impl RiskTier {
    pub fn requires_governance(&self) -> bool {
        !matches!(self, Self::Direct)
    }

    pub fn requires_supermajority(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

/// Treasury risk brackets and reserve policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasuryParams {
    /// Largest amount payable without governance.
    pub direct_ceiling: Amount,
    /// Largest amount payable with an ordinary governance threshold.
    pub elevated_ceiling: Amount,
    /// Balance that direct disbursements may never dip below.
    pub min_reserve: Amount,
}

impl Default for TreasuryParams {
    fn default() -> Self {
        Self {
            direct_ceiling: Amount::new(1_000),
            elevated_ceiling: Amount::new(100_000),
            min_reserve: Amount::new(10_000),
        }
    }
}

impl TreasuryParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.direct_ceiling > self.elevated_ceiling {
            return Err(ParamError::new(
                "direct_ceiling",
                "must not exceed elevated_ceiling",
            ));
        }
        Ok(())
    }

    pub fn tier_for(&self, amount: Amount) -> RiskTier {
        if amount <= self.direct_ceiling {
            RiskTier::Direct
        } else if amount <= self.elevated_ceiling {
            RiskTier::Elevated
        } else {
            RiskTier::Critical
        }
    }
}
