//! Timed call scripts for deterministic replay.
//!
//! A script is a JSON array of steps. Each step names the logical time it
//! runs at and one node entry point:
//!
//! ```json
//! [
//!   { "at": 0, "call": "apply_as_operator", "candidate": "op-1", "stake": 10000 },
//!   { "at": 1, "call": "propose", "proposer": "signer-1",
//!     "action": { "approve_operator": { "operator": "op-1" } } }
//! ]
//! ```
//!
//! Salts are plain strings; their UTF-8 bytes are hashed.

use serde::{Deserialize, Serialize};

use concord_governance::{Action, CancelOutcome, ProposalStatus};
use concord_oracle::{FailureReason, FinalizeOutcome};
use concord_types::{Amount, Clock, ContributionReport, FundTransfer, Principal, RoundId};

use crate::node::ConcordNode;
use crate::NodeError;

/// One scripted call and the time it runs at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at: u64,
    #[serde(flatten)]
    pub call: Call,
}

/// A node entry point with its arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    Propose { proposer: Principal, action: Action },
    Sign { id: u64, signer: Principal },
    Execute { id: u64 },
    Cancel { id: u64, signer: Principal },
    ExpireStale,
    ApplyAsOperator { candidate: Principal, stake: Amount },
    WithdrawApplication { candidate: Principal },
    AddStake { operator: Principal, amount: Amount },
    Resign { operator: Principal },
    OpenRound { round: RoundId, opener: Principal },
    /// Commit to `value`; the commitment is computed from the salt.
    Commit {
        round: RoundId,
        operator: Principal,
        salt: String,
        value: ContributionReport,
    },
    CloseCommits { round: RoundId },
    Reveal {
        round: RoundId,
        operator: Principal,
        salt: String,
        value: ContributionReport,
    },
    Finalize { round: RoundId },
    Claim { contributor: Principal },
    Deposit { from: Principal, amount: Amount },
    ProposeDisbursement {
        proposer: Principal,
        amount: Amount,
        destination: Principal,
    },
    ExecuteDirect { id: u64, signer: Principal },
    CancelDisbursement { id: u64, caller: Principal },
}

/// What a successful call produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallOutcome {
    Done,
    Proposed { id: u64 },
    Signed { status: ProposalStatus },
    Cancel { result: CancelOutcome },
    Expired { ids: Vec<u64> },
    Committed { commitment: String },
    Finalized { seq: u64 },
    RoundFailed { reason: FailureReason },
    Refunded { amount: Amount },
    Staked { total: Amount },
    Paid { amount: Amount, records: usize, through_seq: u64 },
    TreasuryBalance { balance: Amount },
    DisbursementProposed { id: u64 },
}

impl<C: Clock, L: FundTransfer> ConcordNode<C, L> {
    /// Run one scripted call at the clock's current time.
    pub fn apply(&mut self, call: &Call) -> Result<CallOutcome, NodeError> {
        let outcome = match call {
            Call::Propose { proposer, action } => CallOutcome::Proposed {
                id: self.propose(action.clone(), proposer)?,
            },
            Call::Sign { id, signer } => CallOutcome::Signed {
                status: self.sign(*id, signer)?,
            },
            Call::Execute { id } => {
                self.execute(*id)?;
                CallOutcome::Done
            }
            Call::Cancel { id, signer } => CallOutcome::Cancel {
                result: self.cancel(*id, signer)?,
            },
            Call::ExpireStale => CallOutcome::Expired {
                ids: self.expire_stale(),
            },
            Call::ApplyAsOperator { candidate, stake } => {
                self.apply_as_operator(candidate, *stake)?;
                CallOutcome::Done
            }
            Call::WithdrawApplication { candidate } => CallOutcome::Refunded {
                amount: self.withdraw_application(candidate)?,
            },
            Call::AddStake { operator, amount } => CallOutcome::Staked {
                total: self.add_stake(operator, *amount)?,
            },
            Call::Resign { operator } => CallOutcome::Refunded {
                amount: self.resign(operator)?,
            },
            Call::OpenRound { round, opener } => {
                self.open_round(round.clone(), opener)?;
                CallOutcome::Done
            }
            Call::Commit {
                round,
                operator,
                salt,
                value,
            } => {
                let commitment = self.commitment_for(round, operator, salt.as_bytes(), value);
                self.commit(round, operator, commitment)?;
                CallOutcome::Committed {
                    commitment: commitment.to_string(),
                }
            }
            Call::CloseCommits { round } => {
                self.close_commits(round)?;
                CallOutcome::Done
            }
            Call::Reveal {
                round,
                operator,
                salt,
                value,
            } => {
                self.reveal(round, operator, salt.as_bytes(), value.clone())?;
                CallOutcome::Done
            }
            Call::Finalize { round } => match self.finalize(round)? {
                FinalizeOutcome::Finalized { seq } => CallOutcome::Finalized { seq },
                FinalizeOutcome::Failed(reason) => CallOutcome::RoundFailed { reason },
            },
            Call::Claim { contributor } => {
                let receipt = self.claim(contributor)?;
                CallOutcome::Paid {
                    amount: receipt.amount,
                    records: receipt.rewarded_records,
                    through_seq: receipt.through_seq,
                }
            }
            Call::Deposit { from, amount } => CallOutcome::TreasuryBalance {
                balance: self.deposit(from, *amount)?,
            },
            Call::ProposeDisbursement {
                proposer,
                amount,
                destination,
            } => CallOutcome::DisbursementProposed {
                id: self.propose_disbursement(proposer, *amount, destination)?,
            },
            Call::ExecuteDirect { id, signer } => {
                self.execute_direct(*id, signer)?;
                CallOutcome::Done
            }
            Call::CancelDisbursement { id, caller } => {
                self.cancel_disbursement(*id, caller)?;
                CallOutcome::Done
            }
        };
        Ok(outcome)
    }
}

/// Parse a JSON script.
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>, NodeError> {
    serde_json::from_str(json).map_err(|e| NodeError::Config(format!("invalid script: {e}")))
}
