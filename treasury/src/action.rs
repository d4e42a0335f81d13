use concord_types::{Amount, Principal, RiskTier, Timestamp};
use serde::{Deserialize, Serialize};

/// Who may settle a disbursement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalPath {
    /// A direct-authority signer.
    Direct,
    /// An executed governance proposal.
    Governance,
    /// An executed governance proposal signed by a supermajority.
    Supermajority,
}

impl From<RiskTier> for ApprovalPath {
    fn from(tier: RiskTier) -> Self {
        match tier {
            RiskTier::Direct => Self::Direct,
            RiskTier::Elevated => Self::Governance,
            RiskTier::Critical => Self::Supermajority,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Proposed,
    Executed,
    Cancelled,
}

/// A proposed or settled disbursement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryAction {
    pub id: u64,
    pub amount: Amount,
    pub destination: Principal,
    /// Tier under the brackets in force at proposal time.
    pub tier: RiskTier,
    pub path: ApprovalPath,
    pub proposer: Principal,
    pub status: ActionStatus,
    pub created_at: Timestamp,
    pub settled_at: Option<Timestamp>,
}

impl TreasuryAction {
    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Proposed
    }
}
