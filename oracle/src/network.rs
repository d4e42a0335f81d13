//! The oracle network: operator admission, rounds, finalization and slashing.

use concord_governance::{Governed, PauseState, Warrant};
use concord_store::{MetaStore, OracleStore, StoreError};
use concord_types::{
    Amount, CommitHasher, ConsensusRecord, ContributionReport, Digest, FundTransfer, Oracle,
    OracleParams, Principal, RoundId, Timestamp,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::OracleError;
use crate::operator::{DeactivationReason, ExitReason, OperatorStatus, OracleOperator};
use crate::round::{FailureReason, Reveal, Round, RoundPhase, Submission};

const PARAMS_KEY: &str = "oracle.params";
const NEXT_SEQ_KEY: &str = "oracle.next_seq";
const PAUSE_KEY: &str = "oracle.pause";

/// Result of finalizing a round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Finalized { seq: u64 },
    Failed(FailureReason),
}

/// Owns operators, rounds and the consensus log.
pub struct OracleNetwork {
    params: OracleParams,
    hasher: Box<dyn CommitHasher>,
    operators: BTreeMap<Principal, OracleOperator>,
    rounds: BTreeMap<RoundId, Round>,
    consensus: BTreeMap<u64, ConsensusRecord>,
    next_seq: u64,
    pause: PauseState,
}

impl OracleNetwork {
    pub fn new(params: OracleParams, hasher: Box<dyn CommitHasher>) -> Result<Self, OracleError> {
        params.validate()?;
        Ok(Self {
            params,
            hasher,
            operators: BTreeMap::new(),
            rounds: BTreeMap::new(),
            consensus: BTreeMap::new(),
            next_seq: 1,
            pause: PauseState::default(),
        })
    }

    // ── Admission ────────────────────────────────────────────────────────

    /// Escrow `stake` and file an application for governance approval.
    pub fn apply_as_operator(
        &mut self,
        candidate: &Principal,
        stake: Amount,
        now: Timestamp,
        ledger: &mut dyn FundTransfer,
    ) -> Result<(), OracleError> {
        if !candidate.is_valid_caller() {
            return Err(OracleError::InvalidCaller(candidate.clone()));
        }
        if stake < self.params.min_stake {
            return Err(OracleError::InsufficientStake {
                offered: stake,
                minimum: self.params.min_stake,
            });
        }
        if self.operators.get(candidate).is_some_and(|o| o.holds_stake()) {
            return Err(OracleError::AlreadyRegistered(candidate.clone()));
        }

        ledger.transfer(candidate, &Principal::oracle_escrow(), stake)?;
        self.operators.insert(
            candidate.clone(),
            OracleOperator {
                id: candidate.clone(),
                stake,
                reliability_bps: self.params.initial_reliability_bps,
                status: OperatorStatus::Applied,
                applied_at: now,
                admitted_at: None,
            },
        );
        tracing::info!(candidate = %candidate, %stake, "operator application filed");
        Ok(())
    }

    /// Withdraw a pending application and recover its stake.
    pub fn withdraw_application(
        &mut self,
        candidate: &Principal,
        ledger: &mut dyn FundTransfer,
    ) -> Result<Amount, OracleError> {
        self.require_status(candidate, |s| s == OperatorStatus::Applied)?;
        self.exit(candidate, ExitReason::Withdrawn, ledger)
    }

    /// Admit an applicant, or re-admit a deactivated operator. Reliability
    /// restarts from the initial score.
    pub fn approve_operator(
        &mut self,
        _warrant: &Warrant,
        operator: &Principal,
        now: Timestamp,
    ) -> Result<(), OracleError> {
        self.require_status(operator, |s| {
            matches!(s, OperatorStatus::Applied | OperatorStatus::Inactive(_))
        })?;
        let minimum = self.params.min_stake;
        let initial = self.params.initial_reliability_bps;
        let record = self.operator_mut(operator)?;
        if record.stake < minimum {
            return Err(OracleError::InsufficientStake {
                offered: record.stake,
                minimum,
            });
        }
        record.status = OperatorStatus::Active;
        record.admitted_at = Some(now);
        record.reliability_bps = initial;
        tracing::info!(operator = %operator, stake = %record.stake, "operator admitted");
        Ok(())
    }

    pub fn reject_application(
        &mut self,
        _warrant: &Warrant,
        candidate: &Principal,
        ledger: &mut dyn FundTransfer,
    ) -> Result<Amount, OracleError> {
        self.require_status(candidate, |s| s == OperatorStatus::Applied)?;
        self.exit(candidate, ExitReason::Rejected, ledger)
    }

    /// Top up escrowed stake. Does not reactivate a deactivated operator.
    pub fn add_stake(
        &mut self,
        operator: &Principal,
        amount: Amount,
        ledger: &mut dyn FundTransfer,
    ) -> Result<Amount, OracleError> {
        if amount.is_zero() {
            return Err(OracleError::ZeroAmount);
        }
        self.require_status(operator, |s| !matches!(s, OperatorStatus::Exited(_)))?;
        let current = self.operator_mut(operator)?.stake;
        let total = current.saturating_add(amount);
        ledger.transfer(operator, &Principal::oracle_escrow(), amount)?;
        self.operator_mut(operator)?.stake = total;
        tracing::info!(operator = %operator, %amount, %total, "stake added");
        Ok(total)
    }

    /// Leave the network and recover the remaining stake.
    pub fn resign(
        &mut self,
        operator: &Principal,
        ledger: &mut dyn FundTransfer,
    ) -> Result<Amount, OracleError> {
        self.require_status(operator, |s| {
            matches!(s, OperatorStatus::Active | OperatorStatus::Inactive(_))
        })?;
        self.require_no_pending_commitment(operator)?;
        self.exit(operator, ExitReason::Resigned, ledger)
    }

    pub fn remove_operator(
        &mut self,
        _warrant: &Warrant,
        operator: &Principal,
        ledger: &mut dyn FundTransfer,
    ) -> Result<Amount, OracleError> {
        self.require_status(operator, |s| {
            matches!(s, OperatorStatus::Active | OperatorStatus::Inactive(_))
        })?;
        self.require_no_pending_commitment(operator)?;
        self.exit(operator, ExitReason::Removed, ledger)
    }

    /// Replace the parameters. Active operators now below the minimum stake
    /// are deactivated; open rounds keep the parameters they opened with.
    pub fn set_params(
        &mut self,
        _warrant: &Warrant,
        params: OracleParams,
    ) -> Result<(), OracleError> {
        params.validate()?;
        self.params = params;
        let ids: Vec<Principal> = self.operators.keys().cloned().collect();
        self.enforce_activity(&ids);
        tracing::info!(
            min_stake = %self.params.min_stake,
            threshold_bps = self.params.consensus_threshold_bps,
            "oracle params updated"
        );
        Ok(())
    }

    // ── Rounds ───────────────────────────────────────────────────────────

    pub fn open_round(
        &mut self,
        round: RoundId,
        opener: &Principal,
        now: Timestamp,
    ) -> Result<(), OracleError> {
        self.require_active(opener)?;
        if let Some(until) = self.pause.until().filter(|_| self.pause.is_active(now)) {
            return Err(OracleError::Paused(until));
        }
        if self.rounds.contains_key(&round) {
            return Err(OracleError::RoundExists(round));
        }
        let opened = Round::open(round.clone(), opener.clone(), now, &self.params);
        tracing::info!(
            round = %round,
            opener = %opener,
            commit_deadline = %opened.commit_deadline,
            reveal_deadline = %opened.reveal_deadline,
            "round opened"
        );
        self.rounds.insert(round, opened);
        Ok(())
    }

    /// Record a commitment. Stake is snapshotted here and is the operator's
    /// weight for the rest of the round.
    pub fn commit(
        &mut self,
        round_id: &RoundId,
        operator: &Principal,
        commitment: Digest,
        now: Timestamp,
    ) -> Result<(), OracleError> {
        let stake = self.require_active(operator)?.stake;
        let round = self
            .rounds
            .get_mut(round_id)
            .ok_or_else(|| OracleError::RoundNotFound(round_id.clone()))?;
        let phase = round.phase_at(now);
        if phase != RoundPhase::Open {
            return Err(OracleError::WrongPhase {
                round: round_id.clone(),
                phase,
                expected: "Open",
            });
        }
        if round.has_commitment_from(operator) {
            return Err(OracleError::DuplicateCommit {
                round: round_id.clone(),
                operator: operator.clone(),
            });
        }
        round.submissions.insert(
            operator.clone(),
            Submission {
                stake,
                commitment,
                committed_at: now,
                reveal: None,
            },
        );
        tracing::debug!(round = %round_id, operator = %operator, "commitment recorded");
        Ok(())
    }

    /// Persist the move from the commit phase to the reveal phase once the
    /// commit deadline has passed. Anyone may call.
    pub fn close_commits(&mut self, round_id: &RoundId, now: Timestamp) -> Result<(), OracleError> {
        let round = self
            .rounds
            .get_mut(round_id)
            .ok_or_else(|| OracleError::RoundNotFound(round_id.clone()))?;
        if round.phase != RoundPhase::Open || round.phase_at(now) != RoundPhase::Closed {
            return Err(OracleError::WrongPhase {
                round: round_id.clone(),
                phase: round.phase_at(now),
                expected: "Open past its commit deadline",
            });
        }
        round.phase = RoundPhase::Closed;
        tracing::debug!(round = %round_id, commits = round.submissions.len(), "commit phase closed");
        Ok(())
    }

    /// Reveal a committed value. The reveal must hash, with the same salt,
    /// to the commitment this operator made in this round.
    pub fn reveal(
        &mut self,
        round_id: &RoundId,
        operator: &Principal,
        salt: &[u8],
        value: ContributionReport,
        now: Timestamp,
    ) -> Result<(), OracleError> {
        let round = self
            .rounds
            .get_mut(round_id)
            .ok_or_else(|| OracleError::RoundNotFound(round_id.clone()))?;
        let phase = round.phase_at(now);
        if phase != RoundPhase::Closed {
            return Err(OracleError::WrongPhase {
                round: round_id.clone(),
                phase,
                expected: "Closed",
            });
        }
        if now >= round.reveal_deadline {
            return Err(OracleError::RevealDeadlinePassed {
                round: round_id.clone(),
                deadline: round.reveal_deadline,
            });
        }
        let submission = round
            .submissions
            .get_mut(operator)
            .ok_or_else(|| OracleError::NoCommit {
                round: round_id.clone(),
                operator: operator.clone(),
            })?;
        if submission.reveal.is_some() {
            return Err(OracleError::AlreadyRevealed {
                round: round_id.clone(),
                operator: operator.clone(),
            });
        }
        if self.hasher.commitment(round_id, operator, salt, &value) != submission.commitment {
            return Err(OracleError::HashMismatch {
                round: round_id.clone(),
                operator: operator.clone(),
            });
        }

        let digest = self.hasher.value_digest(&value);
        submission.reveal = Some(Reveal {
            value,
            digest,
            revealed_at: now,
        });
        round.phase = RoundPhase::Closed;
        tracing::debug!(round = %round_id, operator = %operator, value = %digest, "value revealed");
        Ok(())
    }

    /// Close a round once its reveal deadline has passed. Anyone may call.
    pub fn finalize(
        &mut self,
        round_id: &RoundId,
        now: Timestamp,
        ledger: &mut dyn FundTransfer,
    ) -> Result<FinalizeOutcome, OracleError> {
        let round = self
            .rounds
            .get(round_id)
            .ok_or_else(|| OracleError::RoundNotFound(round_id.clone()))?;
        if round.phase.is_terminal() {
            return Err(OracleError::WrongPhase {
                round: round_id.clone(),
                phase: round.phase,
                expected: "Open or Closed",
            });
        }
        if now < round.reveal_deadline {
            return Err(OracleError::RevealsStillOpen {
                round: round_id.clone(),
                deadline: round.reveal_deadline,
            });
        }

        let decision = round.tally().decide(&round.params);
        match decision {
            Ok(digest) => self.settle_consensus(round_id, digest, now, ledger),
            Err(reason) => Ok(self.settle_failure(round_id, reason)),
        }
    }

    fn settle_consensus(
        &mut self,
        round_id: &RoundId,
        digest: Digest,
        now: Timestamp,
        ledger: &mut dyn FundTransfer,
    ) -> Result<FinalizeOutcome, OracleError> {
        let round = self
            .rounds
            .get(round_id)
            .ok_or_else(|| OracleError::RoundNotFound(round_id.clone()))?;
        let params = round.params.clone();

        let mut agreeing = Vec::new();
        let mut dissenting = Vec::new();
        let mut absent = Vec::new();
        let mut value = ContributionReport::default();
        for (operator, submission) in &round.submissions {
            match &submission.reveal {
                Some(reveal) if reveal.digest == digest => {
                    if agreeing.is_empty() {
                        value = reveal.value.clone();
                    }
                    agreeing.push(operator.clone());
                }
                Some(_) => dissenting.push(operator.clone()),
                None => absent.push(operator.clone()),
            }
        }

        let slashes: Vec<(Principal, Amount)> = absent
            .iter()
            .map(|op| {
                let stake = self.operators.get(op).map(|o| o.stake).unwrap_or_default();
                (op.clone(), stake.min(params.no_reveal_penalty))
            })
            .collect();
        let slashed: Amount = slashes.iter().map(|(_, amount)| *amount).sum();
        if !slashed.is_zero() {
            ledger.transfer(&Principal::oracle_escrow(), &Principal::treasury(), slashed)?;
        }

        // Nothing below can fail.
        for op in &agreeing {
            if let Some(record) = self.operators.get_mut(op) {
                record.record_outcome(true, params.reliability_alpha_bps);
            }
        }
        for op in &dissenting {
            if let Some(record) = self.operators.get_mut(op) {
                record.record_outcome(false, params.reliability_alpha_bps);
                tracing::info!(round = %round_id, operator = %op, reliability = record.reliability_bps, "operator dissented");
            }
        }
        for (op, amount) in &slashes {
            if let Some(record) = self.operators.get_mut(op) {
                record.stake = record.stake.saturating_sub(*amount);
                record.record_outcome(false, params.no_reveal_alpha_bps);
                tracing::warn!(
                    round = %round_id,
                    operator = %op,
                    slashed = %amount,
                    remaining = %record.stake,
                    reliability = record.reliability_bps,
                    "operator slashed for not revealing"
                );
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let touched: Vec<Principal> = dissenting.iter().chain(&absent).cloned().collect();
        self.consensus.insert(
            seq,
            ConsensusRecord {
                seq,
                round: round_id.clone(),
                value,
                value_digest: digest,
                contributors: agreeing,
                finalized_at: now,
            },
        );
        if let Some(round) = self.rounds.get_mut(round_id) {
            round.phase = RoundPhase::Finalized;
            round.consensus_seq = Some(seq);
        }
        self.enforce_activity(&touched);
        tracing::info!(round = %round_id, seq, value = %digest, %slashed, "round finalized");
        Ok(FinalizeOutcome::Finalized { seq })
    }

    fn settle_failure(&mut self, round_id: &RoundId, reason: FailureReason) -> FinalizeOutcome {
        let (absent, alpha) = match self.rounds.get(round_id) {
            Some(round) => (
                round.non_revealers().cloned().collect::<Vec<_>>(),
                round.params.reliability_alpha_bps,
            ),
            None => (Vec::new(), self.params.reliability_alpha_bps),
        };
        for op in &absent {
            if let Some(record) = self.operators.get_mut(op) {
                record.record_outcome(false, alpha);
            }
        }
        if let Some(round) = self.rounds.get_mut(round_id) {
            round.phase = RoundPhase::Failed;
            round.failure = Some(reason.clone());
        }
        self.enforce_activity(&absent);
        tracing::warn!(round = %round_id, ?reason, "round failed");
        FinalizeOutcome::Failed(reason)
    }

    /// Deactivate any listed active operator below the reliability floor or
    /// the minimum stake.
    fn enforce_activity(&mut self, operators: &[Principal]) {
        for op in operators {
            let Some(record) = self.operators.get_mut(op) else {
                continue;
            };
            if !record.is_active() {
                continue;
            }
            let reason = if record.reliability_bps < self.params.reliability_floor_bps {
                DeactivationReason::LowReliability
            } else if record.stake < self.params.min_stake {
                DeactivationReason::InsufficientStake
            } else {
                continue;
            };
            record.status = OperatorStatus::Inactive(reason);
            tracing::warn!(operator = %op, ?reason, "operator deactivated");
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn operator_mut(&mut self, operator: &Principal) -> Result<&mut OracleOperator, OracleError> {
        self.operators
            .get_mut(operator)
            .ok_or_else(|| OracleError::OperatorNotFound(operator.clone()))
    }

    fn require_status(
        &self,
        operator: &Principal,
        allowed: impl Fn(OperatorStatus) -> bool,
    ) -> Result<&OracleOperator, OracleError> {
        let record = self
            .operators
            .get(operator)
            .ok_or_else(|| OracleError::OperatorNotFound(operator.clone()))?;
        if !allowed(record.status) {
            return Err(OracleError::WrongOperatorStatus {
                operator: operator.clone(),
                status: record.status,
            });
        }
        Ok(record)
    }

    fn require_active(&self, operator: &Principal) -> Result<&OracleOperator, OracleError> {
        match self.operators.get(operator) {
            Some(record) if record.is_active() => Ok(record),
            _ => Err(OracleError::NotActive(operator.clone())),
        }
    }

    fn require_no_pending_commitment(&self, operator: &Principal) -> Result<(), OracleError> {
        match self
            .rounds
            .values()
            .find(|r| !r.phase.is_terminal() && r.has_commitment_from(operator))
        {
            Some(round) => Err(OracleError::PendingCommitment {
                operator: operator.clone(),
                round: round.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Refund all remaining stake and mark the operator as exited.
    fn exit(
        &mut self,
        operator: &Principal,
        reason: ExitReason,
        ledger: &mut dyn FundTransfer,
    ) -> Result<Amount, OracleError> {
        let stake = self.operator_mut(operator)?.stake;
        if !stake.is_zero() {
            ledger.transfer(&Principal::oracle_escrow(), operator, stake)?;
        }
        let record = self.operator_mut(operator)?;
        record.stake = Amount::ZERO;
        record.status = OperatorStatus::Exited(reason);
        tracing::info!(operator = %operator, ?reason, refunded = %stake, "operator exited");
        Ok(stake)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn params(&self) -> &OracleParams {
        &self.params
    }

    pub fn operator(&self, operator: &Principal) -> Option<&OracleOperator> {
        self.operators.get(operator)
    }

    pub fn operators(&self) -> impl Iterator<Item = &OracleOperator> {
        self.operators.values()
    }

    pub fn active_operators(&self) -> impl Iterator<Item = &OracleOperator> {
        self.operators.values().filter(|o| o.is_active())
    }

    pub fn round(&self, round: &RoundId) -> Option<&Round> {
        self.rounds.get(round)
    }

    /// The commitment an operator should submit for `value`.
    pub fn commitment_for(
        &self,
        round: &RoundId,
        operator: &Principal,
        salt: &[u8],
        value: &ContributionReport,
    ) -> Digest {
        self.hasher.commitment(round, operator, salt, value)
    }

    // ── Persistence ──────────────────────────────────────────────────────

    pub fn save_to_store<S>(&self, store: &S) -> Result<(), OracleError>
    where
        S: OracleStore + MetaStore + ?Sized,
    {
        store
            .put_meta(PARAMS_KEY, &encode(&self.params)?)
            .map_err(storage)?;
        store
            .put_meta(NEXT_SEQ_KEY, &self.next_seq.to_be_bytes())
            .map_err(storage)?;
        store
            .put_meta(PAUSE_KEY, &encode(&self.pause)?)
            .map_err(storage)?;
        for (id, record) in &self.operators {
            store.put_operator(id, &encode(record)?).map_err(storage)?;
        }
        for (id, round) in &self.rounds {
            store.put_round(id, &encode(round)?).map_err(storage)?;
        }
        for (seq, record) in &self.consensus {
            store.put_consensus(*seq, &encode(record)?).map_err(storage)?;
        }
        Ok(())
    }

    pub fn load_from_store<S>(store: &S, hasher: Box<dyn CommitHasher>) -> Result<Self, OracleError>
    where
        S: OracleStore + MetaStore + ?Sized,
    {
        let params: OracleParams = match store.get_meta(PARAMS_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(OracleError::Storage("missing oracle params".into())),
        };
        let pause = match store.get_meta(PAUSE_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => PauseState::default(),
        };
        let mut operators = BTreeMap::new();
        for (id, bytes) in store.iter_operators().map_err(storage)? {
            operators.insert(id, decode(&bytes)?);
        }
        let mut rounds = BTreeMap::new();
        for (id, bytes) in store.iter_rounds().map_err(storage)? {
            rounds.insert(id, decode(&bytes)?);
        }
        let mut consensus = BTreeMap::new();
        for (seq, bytes) in store.iter_consensus().map_err(storage)? {
            consensus.insert(seq, decode(&bytes)?);
        }
        let next_seq = match store.get_meta(NEXT_SEQ_KEY).map_err(storage)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| OracleError::Storage("corrupt consensus counter".into()))?;
                u64::from_be_bytes(raw)
            }
            None => consensus.keys().next_back().map_or(1, |last| last + 1),
        };
        Ok(Self {
            params,
            hasher,
            operators,
            rounds,
            consensus,
            next_seq,
            pause,
        })
    }
}

impl Oracle for OracleNetwork {
    fn latest_seq(&self) -> u64 {
        self.next_seq - 1
    }

    fn consensus(&self, seq: u64) -> Option<ConsensusRecord> {
        self.consensus.get(&seq).cloned()
    }

    fn consensus_after(&self, after: u64, limit: usize) -> Vec<ConsensusRecord> {
        self.consensus
            .range((Bound::Excluded(after), Bound::Unbounded))
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

impl Governed for OracleNetwork {
    fn pause(&mut self, warrant: &Warrant, until: Timestamp) -> bool {
        let engaged = self.pause.engage(warrant, until);
        if engaged {
            tracing::warn!(%until, "oracle paused");
        }
        engaged
    }

    fn lift_pause(&mut self, warrant: &Warrant) {
        self.pause.lift(warrant);
        tracing::info!("oracle pause lifted");
    }

    fn paused_until(&self) -> Option<Timestamp> {
        self.pause.until()
    }
}

fn storage(e: StoreError) -> OracleError {
    OracleError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, OracleError> {
    bincode::serialize(value).map_err(|e| OracleError::Storage(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, OracleError> {
    bincode::deserialize(bytes).map_err(|e| OracleError::Storage(e.to_string()))
}
