//! The Concord node: one instance of every component over injected
//! capabilities.
//!
//! Every entry point reads the current time from the node's [`Clock`], so
//! callers never pass timestamps. Privileged changes reach the oracle,
//! reward and treasury components only through [`ConcordNode::execute`].

use concord_crypto::Blake2bCommitHasher;
use concord_governance::{Action, CancelOutcome, GovernanceEngine, ProposalStatus};
use concord_oracle::{FinalizeOutcome, OracleNetwork};
use concord_rewards::{ClaimReceipt, RewardController};
use concord_store::{
    ClaimStore, GovernanceStore, MetaStore, OracleStore, TreasuryStore, SCHEMA_VERSION,
};
use concord_treasury::TreasuryManager;
use concord_types::{
    check_economic_security, Amount, Clock, ContributionReport, Digest, FundTransfer, NetworkId,
    Principal, RoundId, Timestamp,
};

use crate::config::NodeConfig;
use crate::dispatch::Dispatch;
use crate::NodeError;

/// The DAO core.
pub struct ConcordNode<C: Clock, L: FundTransfer> {
    network: NetworkId,
    clock: C,
    ledger: L,
    governance: GovernanceEngine,
    oracle: OracleNetwork,
    rewards: RewardController,
    treasury: TreasuryManager,
}

impl<C: Clock, L: FundTransfer> ConcordNode<C, L> {
    /// Build a fresh node from configuration.
    pub fn new(config: &NodeConfig, clock: C, ledger: L) -> Result<Self, NodeError> {
        config.validate()?;
        let governance = GovernanceEngine::new(
            config.genesis_signers.iter().cloned(),
            config.governance.clone(),
        )?;
        let oracle = OracleNetwork::new(config.oracle.clone(), Box::new(Blake2bCommitHasher))?;
        let rewards =
            RewardController::new(config.reward_curve.clone(), config.max_records_per_claim)?;
        let treasury =
            TreasuryManager::new(config.treasury.clone(), config.direct_signers.iter().cloned())?;

        tracing::info!(
            network = config.network.as_str(),
            signers = config.genesis_signers.len(),
            threshold = config.governance.threshold,
            supermajority = config.governance.supermajority,
            direct_signers = config.direct_signers.len(),
            "node initialised"
        );
        Ok(Self {
            network: config.network,
            clock,
            ledger,
            governance,
            oracle,
            rewards,
            treasury,
        })
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Governance ───────────────────────────────────────────────────────

    pub fn propose(&mut self, action: Action, proposer: &Principal) -> Result<u64, NodeError> {
        let now = self.now();
        Ok(self.governance.propose(action, proposer, now)?)
    }

    pub fn sign(&mut self, id: u64, signer: &Principal) -> Result<ProposalStatus, NodeError> {
        let now = self.now();
        Ok(self.governance.sign(id, signer, now)?)
    }

    /// Execute an approved proposal whose timelock has elapsed. Anyone may
    /// call; the action runs on the proposal's authority.
    pub fn execute(&mut self, id: u64) -> Result<(), NodeError> {
        let now = self.now();
        let mut dispatch = Dispatch {
            now,
            oracle: &mut self.oracle,
            rewards: &mut self.rewards,
            treasury: &mut self.treasury,
            ledger: &mut self.ledger,
        };
        self.governance.execute(id, now, &mut dispatch)?;
        Ok(())
    }

    pub fn cancel(&mut self, id: u64, signer: &Principal) -> Result<CancelOutcome, NodeError> {
        let now = self.now();
        Ok(self.governance.cancel(id, signer, now)?)
    }

    pub fn expire_stale(&mut self) -> Vec<u64> {
        let now = self.now();
        self.governance.expire_stale(now)
    }

    // ── Oracle ───────────────────────────────────────────────────────────

    pub fn apply_as_operator(&mut self, candidate: &Principal, stake: Amount) -> Result<(), NodeError> {
        let now = self.now();
        Ok(self
            .oracle
            .apply_as_operator(candidate, stake, now, &mut self.ledger)?)
    }

    pub fn withdraw_application(&mut self, candidate: &Principal) -> Result<Amount, NodeError> {
        Ok(self.oracle.withdraw_application(candidate, &mut self.ledger)?)
    }

    pub fn add_stake(&mut self, operator: &Principal, amount: Amount) -> Result<Amount, NodeError> {
        Ok(self.oracle.add_stake(operator, amount, &mut self.ledger)?)
    }

    pub fn resign(&mut self, operator: &Principal) -> Result<Amount, NodeError> {
        Ok(self.oracle.resign(operator, &mut self.ledger)?)
    }

    pub fn open_round(&mut self, round: RoundId, opener: &Principal) -> Result<(), NodeError> {
        let now = self.now();
        Ok(self.oracle.open_round(round, opener, now)?)
    }

    pub fn commit(
        &mut self,
        round: &RoundId,
        operator: &Principal,
        commitment: Digest,
    ) -> Result<(), NodeError> {
        let now = self.now();
        Ok(self.oracle.commit(round, operator, commitment, now)?)
    }

    pub fn close_commits(&mut self, round: &RoundId) -> Result<(), NodeError> {
        let now = self.now();
        Ok(self.oracle.close_commits(round, now)?)
    }

    pub fn reveal(
        &mut self,
        round: &RoundId,
        operator: &Principal,
        salt: &[u8],
        value: ContributionReport,
    ) -> Result<(), NodeError> {
        let now = self.now();
        Ok(self.oracle.reveal(round, operator, salt, value, now)?)
    }

    pub fn finalize(&mut self, round: &RoundId) -> Result<FinalizeOutcome, NodeError> {
        let now = self.now();
        Ok(self.oracle.finalize(round, now, &mut self.ledger)?)
    }

    /// The commitment `operator` should submit for `value` in `round`.
    pub fn commitment_for(
        &self,
        round: &RoundId,
        operator: &Principal,
        salt: &[u8],
        value: &ContributionReport,
    ) -> Digest {
        self.oracle.commitment_for(round, operator, salt, value)
    }

    // ── Rewards ──────────────────────────────────────────────────────────

    pub fn claim(&mut self, contributor: &Principal) -> Result<ClaimReceipt, NodeError> {
        let now = self.now();
        Ok(self
            .rewards
            .claim(contributor, now, &self.oracle, &mut self.ledger)?)
    }

    pub fn pending_reward(&self, contributor: &Principal) -> Amount {
        self.rewards.pending(contributor, &self.oracle)
    }

    // ── Treasury ─────────────────────────────────────────────────────────

    pub fn deposit(&mut self, from: &Principal, amount: Amount) -> Result<Amount, NodeError> {
        Ok(self.treasury.deposit(from, amount, &mut self.ledger)?)
    }

    pub fn propose_disbursement(
        &mut self,
        proposer: &Principal,
        amount: Amount,
        destination: &Principal,
    ) -> Result<u64, NodeError> {
        let now = self.now();
        Ok(self
            .treasury
            .propose_disbursement(proposer, amount, destination, now)?)
    }

    pub fn execute_direct(&mut self, id: u64, signer: &Principal) -> Result<(), NodeError> {
        let now = self.now();
        Ok(self
            .treasury
            .execute_direct(id, signer, now, &mut self.ledger)?)
    }

    pub fn cancel_disbursement(&mut self, id: u64, caller: &Principal) -> Result<(), NodeError> {
        let now = self.now();
        Ok(self.treasury.cancel_disbursement(id, caller, now)?)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn governance(&self) -> &GovernanceEngine {
        &self.governance
    }

    pub fn oracle(&self) -> &OracleNetwork {
        &self.oracle
    }

    pub fn rewards(&self) -> &RewardController {
        &self.rewards
    }

    pub fn treasury(&self) -> &TreasuryManager {
        &self.treasury
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn balance(&self, account: &Principal) -> Amount {
        self.ledger.balance(account)
    }

    pub fn treasury_balance(&self) -> Amount {
        self.ledger.balance(&Principal::treasury())
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Write every component's state and the schema version.
    pub fn save_to_store<S>(&self, store: &S) -> Result<(), NodeError>
    where
        S: GovernanceStore + OracleStore + ClaimStore + TreasuryStore + MetaStore + ?Sized,
    {
        store.set_schema_version(SCHEMA_VERSION)?;
        self.governance.save_to_store(store)?;
        self.oracle.save_to_store(store)?;
        self.rewards.save_to_store(store)?;
        self.treasury.save_to_store(store)?;
        tracing::debug!(schema = SCHEMA_VERSION, "node state saved");
        Ok(())
    }

    /// Rebuild a node from state written by [`Self::save_to_store`]. The
    /// ledger is the host's and is not part of the stored state.
    pub fn load_from_store<S>(
        store: &S,
        config: &NodeConfig,
        clock: C,
        ledger: L,
    ) -> Result<Self, NodeError>
    where
        S: GovernanceStore + OracleStore + ClaimStore + TreasuryStore + MetaStore + ?Sized,
    {
        match store.get_schema_version()? {
            Some(SCHEMA_VERSION) => {}
            found => {
                return Err(NodeError::SchemaMismatch {
                    found,
                    expected: SCHEMA_VERSION,
                })
            }
        }
        let governance = GovernanceEngine::load_from_store(store)?;
        let oracle = OracleNetwork::load_from_store(store, Box::new(Blake2bCommitHasher))?;
        let rewards = RewardController::load_from_store(store, config.max_records_per_claim)?;
        let treasury = TreasuryManager::load_from_store(store)?;
        check_economic_security(oracle.params(), rewards.curve())?;
        tracing::info!(
            network = config.network.as_str(),
            proposals = governance.proposals().count(),
            operators = oracle.operators().count(),
            "node state loaded"
        );
        Ok(Self {
            network: config.network,
            clock,
            ledger,
            governance,
            oracle,
            rewards,
            treasury,
        })
    }
}
