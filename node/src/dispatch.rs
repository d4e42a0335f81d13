//! Routes executed governance actions to the component they govern.

use concord_governance::{Action, ActionDispatcher, DispatchError, Governed, Warrant};
use concord_oracle::OracleNetwork;
use concord_rewards::RewardController;
use concord_treasury::TreasuryManager;
use concord_types::{check_economic_security, ErrorKind, FundTransfer, Timestamp};

/// Borrowed view of every governed component for one execution.
pub(crate) struct Dispatch<'a> {
    pub now: Timestamp,
    pub oracle: &'a mut OracleNetwork,
    pub rewards: &'a mut RewardController,
    pub treasury: &'a mut TreasuryManager,
    pub ledger: &'a mut dyn FundTransfer,
}

fn refused<E>(kind: impl Fn(&E) -> ErrorKind) -> impl Fn(E) -> DispatchError
where
    E: std::fmt::Display,
{
    move |e| DispatchError::new(kind(&e), e.to_string())
}

impl ActionDispatcher for Dispatch<'_> {
    fn dispatch(&mut self, warrant: &Warrant, action: &Action) -> Result<(), DispatchError> {
        let oracle_err = refused(concord_oracle::OracleError::kind);
        let reward_err = refused(concord_rewards::RewardError::kind);
        let treasury_err = refused(concord_treasury::TreasuryError::kind);
        let param_err =
            |e: concord_types::ParamError| DispatchError::new(ErrorKind::InvalidParameter, e.to_string());

        match action {
            Action::ApproveOperator { operator } => self
                .oracle
                .approve_operator(warrant, operator, self.now)
                .map_err(oracle_err),
            Action::RejectApplication { candidate } => self
                .oracle
                .reject_application(warrant, candidate, &mut *self.ledger)
                .map(drop)
                .map_err(oracle_err),
            Action::RemoveOperator { operator } => self
                .oracle
                .remove_operator(warrant, operator, &mut *self.ledger)
                .map(drop)
                .map_err(oracle_err),
            Action::SetOracleParams { params } => {
                check_economic_security(params, self.rewards.curve()).map_err(param_err)?;
                self.oracle
                    .set_params(warrant, params.clone())
                    .map_err(oracle_err)
            }
            Action::SetRewardCurve { curve } => {
                check_economic_security(self.oracle.params(), curve).map_err(param_err)?;
                self.rewards
                    .set_curve(warrant, curve.clone(), &*self.oracle)
                    .map_err(reward_err)
            }
            Action::SetTreasuryParams { params } => self
                .treasury
                .set_params(warrant, params.clone())
                .map_err(treasury_err),
            Action::AddDirectSigner { signer } => self
                .treasury
                .add_direct_signer(warrant, signer)
                .map_err(treasury_err),
            Action::RemoveDirectSigner { signer } => self
                .treasury
                .remove_direct_signer(warrant, signer)
                .map_err(treasury_err),
            Action::Disburse { action_id, tier } => self
                .treasury
                .execute_governed(warrant, *action_id, *tier, self.now, &mut *self.ledger)
                .map_err(treasury_err),
            Action::EmergencyPause { duration } => {
                if !warrant.is_supermajority() {
                    return Err(DispatchError::new(
                        ErrorKind::Unauthorized,
                        "emergency pause needs a supermajority warrant",
                    ));
                }
                let until = self.now.after(*duration);
                self.oracle.pause(warrant, until);
                self.rewards.pause(warrant, until);
                self.treasury.pause(warrant, until);
                tracing::warn!(proposal = warrant.proposal_id(), %until, "emergency pause engaged");
                Ok(())
            }
            Action::LiftPause => {
                self.oracle.lift_pause(warrant);
                self.rewards.lift_pause(warrant);
                self.treasury.lift_pause(warrant);
                Ok(())
            }
            Action::AddSigner { .. }
            | Action::RemoveSigner { .. }
            | Action::SetGovernanceParams { .. } => Err(DispatchError::new(
                ErrorKind::InvalidState,
                format!("{action} is applied by the governance engine"),
            )),
        }
    }
}
