//! Typed governance actions and the warrant that authorizes them.

use concord_types::{
    ErrorKind, GovernanceParams, OracleParams, Principal, RewardCurve, RiskTier, TreasuryParams,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every privileged change the DAO can make.
///
/// There is no generic setter: a change that is not listed here cannot be
/// made at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // Applied by the governance engine itself.
    AddSigner { signer: Principal },
    RemoveSigner { signer: Principal },
    SetGovernanceParams { params: GovernanceParams },

    // Oracle network.
    ApproveOperator { operator: Principal },
    RejectApplication { candidate: Principal },
    RemoveOperator { operator: Principal },
    SetOracleParams { params: OracleParams },

    // Rewards.
    SetRewardCurve { curve: RewardCurve },

    // Treasury.
    SetTreasuryParams { params: TreasuryParams },
    AddDirectSigner { signer: Principal },
    RemoveDirectSigner { signer: Principal },
    Disburse { action_id: u64, tier: RiskTier },

    // Every pausable component at once.
    EmergencyPause { duration: u64 },
    LiftPause,
}

impl Action {
    /// Actions that need the supermajority rather than the plain threshold.
    pub fn requires_supermajority(&self) -> bool {
        match self {
            Self::EmergencyPause { .. }
            | Self::SetGovernanceParams { .. }
            | Self::RemoveSigner { .. } => true,
            Self::Disburse { tier, .. } => tier.requires_supermajority(),
            _ => false,
        }
    }

    /// Actions the governance engine applies without a dispatcher.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::AddSigner { .. } | Self::RemoveSigner { .. } | Self::SetGovernanceParams { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddSigner { .. } => "add_signer",
            Self::RemoveSigner { .. } => "remove_signer",
            Self::SetGovernanceParams { .. } => "set_governance_params",
            Self::ApproveOperator { .. } => "approve_operator",
            Self::RejectApplication { .. } => "reject_application",
            Self::RemoveOperator { .. } => "remove_operator",
            Self::SetOracleParams { .. } => "set_oracle_params",
            Self::SetRewardCurve { .. } => "set_reward_curve",
            Self::SetTreasuryParams { .. } => "set_treasury_params",
            Self::AddDirectSigner { .. } => "add_direct_signer",
            Self::RemoveDirectSigner { .. } => "remove_direct_signer",
            Self::Disburse { .. } => "disburse",
            Self::EmergencyPause { .. } => "emergency_pause",
            Self::LiftPause => "lift_pause",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Proof that a proposal passed governance and is being executed now.
///
/// Only [`crate::GovernanceEngine::execute`] can construct one, and it is
/// neither `Clone` nor `Copy`; holding a `&Warrant` is the sole way into a
/// governance-gated entry point of another component.
#[derive(Debug)]
pub struct Warrant {
    proposal_id: u64,
    signatures: u32,
    supermajority: bool,
}

impl Warrant {
    pub(crate) fn issue(proposal_id: u64, signatures: u32, supermajority: bool) -> Self {
        Self {
            proposal_id,
            signatures,
            supermajority,
        }
    }

    /// Build a warrant without running a proposal. Test builds only.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_tests(proposal_id: u64, supermajority: bool) -> Self {
        Self::issue(proposal_id, 0, supermajority)
    }

    pub fn proposal_id(&self) -> u64 {
        self.proposal_id
    }

    /// Signatures the proposal collected.
    pub fn signatures(&self) -> u32 {
        self.signatures
    }

    /// Whether the proposal was approved at the supermajority level.
    pub fn is_supermajority(&self) -> bool {
        self.supermajority
    }
}

/// A dispatched action was refused by the component that owns it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Applies non-governance actions to the components that own them.
///
/// A dispatch must be all-or-nothing: when it returns an error, no state may
/// have changed.
pub trait ActionDispatcher {
    fn dispatch(&mut self, warrant: &Warrant, action: &Action) -> Result<(), DispatchError>;
}
