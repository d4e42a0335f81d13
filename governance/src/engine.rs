//! Core governance engine: manages proposals through their lifecycle.

use concord_store::{GovernanceStore, MetaStore, StoreError};
use concord_types::{GovernanceParams, MultiSig, ParamError, Principal, Timestamp};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::action::{Action, ActionDispatcher, Warrant};
use crate::error::GovernanceError;
use crate::proposal::{CancelOutcome, Proposal, ProposalStatus, SignerRecord};

const PARAMS_KEY: &str = "governance.params";
const NEXT_ID_KEY: &str = "governance.next_id";

/// Owns the signer set, the governance policy and every proposal.
pub struct GovernanceEngine {
    signers: BTreeMap<Principal, SignerRecord>,
    params: GovernanceParams,
    proposals: BTreeMap<u64, Proposal>,
    next_id: u64,
}

impl GovernanceEngine {
    /// Create an engine with a genesis signer set.
    pub fn new<I>(genesis_signers: I, params: GovernanceParams) -> Result<Self, GovernanceError>
    where
        I: IntoIterator<Item = Principal>,
    {
        let mut signers = BTreeMap::new();
        for signer in genesis_signers {
            if !signer.is_valid_caller() {
                return Err(GovernanceError::InvalidSigner(signer));
            }
            if signers.contains_key(&signer) {
                return Err(GovernanceError::SignerExists(signer));
            }
            signers.insert(
                signer,
                SignerRecord {
                    active: true,
                    added_at: Timestamp::GENESIS,
                    removed_at: None,
                },
            );
        }
        params.validate(signers.len())?;
        Ok(Self {
            signers,
            params,
            proposals: BTreeMap::new(),
            next_id: 1,
        })
    }

    /// Create a proposal. The proposer's signature is recorded immediately.
    pub fn propose(
        &mut self,
        action: Action,
        proposer: &Principal,
        now: Timestamp,
    ) -> Result<u64, GovernanceError> {
        if !self.is_signer(proposer) {
            return Err(GovernanceError::NotSigner(proposer.clone()));
        }
        self.check_action_bounds(&action)?;

        let supermajority = action.requires_supermajority();
        let required = if supermajority {
            self.params.supermajority
        } else {
            self.params.threshold
        };
        let id = self.next_id;
        self.next_id += 1;

        let mut proposal = Proposal {
            id,
            action,
            proposer: proposer.clone(),
            created_at: now,
            signatures: BTreeSet::from([proposer.clone()]),
            required,
            supermajority,
            earliest_execution: now.after(self.params.timelock),
            expires_at: now.after(self.params.proposal_ttl),
            status: ProposalStatus::Pending,
            cancel_votes: BTreeSet::new(),
            executed_at: None,
            closed_at: None,
        };
        tracing::info!(
            id,
            action = %proposal.action,
            proposer = %proposer,
            required,
            "proposal created"
        );
        if proposal.has_threshold() {
            proposal.status = ProposalStatus::Approved;
            tracing::info!(id, signatures = 1, "proposal approved");
        }
        self.proposals.insert(id, proposal);
        Ok(id)
    }

    /// Add a signature. Returns the proposal's status afterwards.
    pub fn sign(
        &mut self,
        id: u64,
        signer: &Principal,
        now: Timestamp,
    ) -> Result<ProposalStatus, GovernanceError> {
        let is_signer = self.is_signer(signer);
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if !is_signer {
            return Err(GovernanceError::NotSigner(signer.clone()));
        }
        if proposal.status != ProposalStatus::Pending {
            return Err(GovernanceError::WrongStatus {
                id,
                status: proposal.status,
                expected: "Pending",
            });
        }
        if now >= proposal.expires_at {
            return Err(GovernanceError::SigningClosed {
                id,
                at: proposal.expires_at,
            });
        }
        if !proposal.signatures.insert(signer.clone()) {
            return Err(GovernanceError::AlreadySigned {
                id,
                signer: signer.clone(),
            });
        }

        tracing::debug!(id, signer = %signer, count = proposal.signature_count(), "proposal signed");
        if proposal.has_threshold() {
            proposal.status = ProposalStatus::Approved;
            tracing::info!(id, signatures = proposal.signature_count(), "proposal approved");
        }
        Ok(proposal.status)
    }

    /// Execute an approved proposal whose timelock has elapsed.
    ///
    /// Signer and policy changes are applied here; every other action goes
    /// to `dispatcher`. If the action fails the proposal stays Approved and
    /// nothing changes.
    pub fn execute(
        &mut self,
        id: u64,
        now: Timestamp,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.status != ProposalStatus::Approved {
            return Err(GovernanceError::WrongStatus {
                id,
                status: proposal.status,
                expected: "Approved",
            });
        }
        if now < proposal.earliest_execution {
            return Err(GovernanceError::TimelockActive {
                id,
                until: proposal.earliest_execution,
            });
        }

        let action = proposal.action.clone();
        if action.is_internal() {
            self.apply_internal(&action, now)?;
        } else {
            let warrant = Warrant::issue(id, proposal.signature_count(), proposal.supermajority);
            self.check_action_bounds(&action)?;
            dispatcher
                .dispatch(&warrant, &action)
                .map_err(|source| GovernanceError::Dispatch { id, source })?;
        }

        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.status = ProposalStatus::Executed;
            proposal.executed_at = Some(now);
        }
        tracing::info!(id, action = %action, "proposal executed");
        Ok(())
    }

    /// Cancel, or vote to cancel, a pending or approved proposal.
    pub fn cancel(
        &mut self,
        id: u64,
        signer: &Principal,
        now: Timestamp,
    ) -> Result<CancelOutcome, GovernanceError> {
        let is_signer = self.is_signer(signer);
        let proposer_may_cancel = self.params.proposer_may_cancel;
        let quorum = self.params.cancel_quorum;
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if !is_signer {
            return Err(GovernanceError::NotSigner(signer.clone()));
        }
        if !matches!(
            proposal.status,
            ProposalStatus::Pending | ProposalStatus::Approved
        ) {
            return Err(GovernanceError::WrongStatus {
                id,
                status: proposal.status,
                expected: "Pending or Approved",
            });
        }

        let unilateral = proposer_may_cancel
            && proposal.status == ProposalStatus::Pending
            && proposal.proposer == *signer;
        if !unilateral {
            if !proposal.cancel_votes.insert(signer.clone()) {
                return Err(GovernanceError::AlreadyVotedCancel {
                    id,
                    signer: signer.clone(),
                });
            }
            let votes = proposal.cancel_votes.len() as u32;
            if votes < quorum {
                tracing::debug!(id, signer = %signer, votes, needed = quorum, "cancel vote recorded");
                return Ok(CancelOutcome::VoteRecorded {
                    votes,
                    needed: quorum,
                });
            }
        }

        proposal.status = ProposalStatus::Cancelled;
        proposal.closed_at = Some(now);
        tracing::info!(id, by = %signer, "proposal cancelled");
        Ok(CancelOutcome::Cancelled)
    }

    /// Mark every pending proposal past its TTL as Expired. Anyone may call.
    pub fn expire_stale(&mut self, now: Timestamp) -> Vec<u64> {
        let mut expired = Vec::new();
        for proposal in self.proposals.values_mut() {
            if proposal.is_stale(now) {
                proposal.status = ProposalStatus::Expired;
                proposal.closed_at = Some(now);
                expired.push(proposal.id);
                tracing::info!(id = proposal.id, "proposal expired");
            }
        }
        expired
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Pending proposals within their TTL and approved proposals awaiting
    /// execution, in id order.
    pub fn active_proposals(&self, now: Timestamp) -> Vec<&Proposal> {
        self.proposals
            .values()
            .filter(|p| p.is_active(now))
            .collect()
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Active signers, in order.
    pub fn signers(&self) -> Vec<&Principal> {
        self.signers
            .iter()
            .filter(|(_, r)| r.active)
            .map(|(p, _)| p)
            .collect()
    }

    pub fn signer_record(&self, principal: &Principal) -> Option<&SignerRecord> {
        self.signers.get(principal)
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    // ── Internal actions ─────────────────────────────────────────────────

    fn apply_internal(&mut self, action: &Action, now: Timestamp) -> Result<(), GovernanceError> {
        match action {
            Action::AddSigner { signer } => self.add_signer(signer, now),
            Action::RemoveSigner { signer } => self.remove_signer(signer, now),
            Action::SetGovernanceParams { params } => self.set_params(params),
            _ => Ok(()),
        }
    }

    fn add_signer(&mut self, signer: &Principal, now: Timestamp) -> Result<(), GovernanceError> {
        if !signer.is_valid_caller() {
            return Err(GovernanceError::InvalidSigner(signer.clone()));
        }
        if self.is_signer(signer) {
            return Err(GovernanceError::SignerExists(signer.clone()));
        }
        self.signers.insert(
            signer.clone(),
            SignerRecord {
                active: true,
                added_at: now,
                removed_at: None,
            },
        );
        tracing::info!(signer = %signer, count = self.signer_count(), "signer added");
        Ok(())
    }

    fn remove_signer(&mut self, signer: &Principal, now: Timestamp) -> Result<(), GovernanceError> {
        if !self.is_signer(signer) {
            return Err(GovernanceError::SignerNotFound(signer.clone()));
        }
        if self.signer_count() <= self.params.min_signers() {
            return Err(GovernanceError::SignerSetTooSmall(signer.clone()));
        }
        if let Some(record) = self.signers.get_mut(signer) {
            record.active = false;
            record.removed_at = Some(now);
        }
        tracing::info!(signer = %signer, count = self.signer_count(), "signer removed");
        Ok(())
    }

    fn set_params(&mut self, params: &GovernanceParams) -> Result<(), GovernanceError> {
        params.validate(self.signer_count())?;
        self.params = params.clone();
        tracing::info!(
            threshold = params.threshold,
            supermajority = params.supermajority,
            timelock = params.timelock,
            "governance params updated"
        );
        Ok(())
    }

    /// Bounds that depend on governance policy rather than on the target
    /// component.
    fn check_action_bounds(&self, action: &Action) -> Result<(), GovernanceError> {
        if let Action::EmergencyPause { duration } = action {
            if *duration == 0 || *duration > self.params.max_pause_duration {
                return Err(ParamError::new(
                    "duration",
                    format!(
                        "pause of {duration} must be between 1 and {}",
                        self.params.max_pause_duration
                    ),
                )
                .into());
            }
        }
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Write the full engine state to a store.
    pub fn save_to_store<S>(&self, store: &S) -> Result<(), GovernanceError>
    where
        S: GovernanceStore + MetaStore + ?Sized,
    {
        store
            .put_meta(PARAMS_KEY, &encode(&self.params)?)
            .map_err(storage)?;
        store
            .put_meta(NEXT_ID_KEY, &self.next_id.to_be_bytes())
            .map_err(storage)?;
        for (signer, record) in &self.signers {
            store.put_signer(signer, &encode(record)?).map_err(storage)?;
        }
        for (id, proposal) in &self.proposals {
            store.put_proposal(*id, &encode(proposal)?).map_err(storage)?;
        }
        Ok(())
    }

    /// Restore engine state written by [`Self::save_to_store`].
    pub fn load_from_store<S>(store: &S) -> Result<Self, GovernanceError>
    where
        S: GovernanceStore + MetaStore + ?Sized,
    {
        let params: GovernanceParams = match store.get_meta(PARAMS_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(GovernanceError::Storage("missing governance params".into())),
        };
        let next_id = match store.get_meta(NEXT_ID_KEY).map_err(storage)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| GovernanceError::Storage("corrupt proposal counter".into()))?;
                u64::from_be_bytes(raw)
            }
            None => 1,
        };

        let mut signers = BTreeMap::new();
        for (signer, bytes) in store.iter_signers().map_err(storage)? {
            signers.insert(signer, decode(&bytes)?);
        }
        let mut proposals = BTreeMap::new();
        for (id, bytes) in store.iter_proposals().map_err(storage)? {
            proposals.insert(id, decode(&bytes)?);
        }
        Ok(Self {
            signers,
            params,
            proposals,
            next_id,
        })
    }
}

impl MultiSig for GovernanceEngine {
    fn is_signer(&self, principal: &Principal) -> bool {
        self.signers.get(principal).is_some_and(|r| r.active)
    }

    fn signer_count(&self) -> usize {
        self.signers.values().filter(|r| r.active).count()
    }

    fn threshold(&self) -> u32 {
        self.params.threshold
    }
}

fn storage(e: StoreError) -> GovernanceError {
    GovernanceError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GovernanceError> {
    bincode::serialize(value).map_err(|e| GovernanceError::Storage(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GovernanceError> {
    bincode::deserialize(bytes).map_err(|e| GovernanceError::Storage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::DispatchError;
    use concord_nullables::NullStore;
    use concord_types::{ErrorKind, RiskTier};

    fn signer(n: u8) -> Principal {
        Principal::new(format!("signer-{n}"))
    }

    fn t(ticks: u64) -> Timestamp {
        Timestamp::new(ticks)
    }

    fn params(threshold: u32, supermajority: u32, timelock: u64) -> GovernanceParams {
        GovernanceParams {
            threshold,
            supermajority,
            timelock,
            proposal_ttl: 1_000,
            cancel_quorum: 2,
            proposer_may_cancel: true,
            max_pause_duration: 500,
        }
    }

    fn engine(signers: u8, threshold: u32, supermajority: u32, timelock: u64) -> GovernanceEngine {
        let params = GovernanceParams {
            cancel_quorum: 2.min(threshold.saturating_sub(1)).max(1),
            ..params(threshold, supermajority, timelock)
        };
        GovernanceEngine::new((1..=signers).map(signer), params).unwrap()
    }

    /// Records dispatched actions; optionally refuses them.
    #[derive(Default)]
    struct RecordingDispatcher {
        seen: Vec<(u64, Action)>,
        refuse: Option<ErrorKind>,
    }

    impl ActionDispatcher for RecordingDispatcher {
        fn dispatch(&mut self, warrant: &Warrant, action: &Action) -> Result<(), DispatchError> {
            if let Some(kind) = self.refuse {
                return Err(DispatchError::new(kind, "refused"));
            }
            self.seen.push((warrant.proposal_id(), action.clone()));
            Ok(())
        }
    }

    fn approve_operator() -> Action {
        Action::ApproveOperator {
            operator: Principal::new("op-1"),
        }
    }

    // ── Proposing and signing ────────────────────────────────────────────

    #[test]
    fn non_signer_cannot_propose() {
        let mut gov = engine(3, 2, 3, 0);
        let err = gov
            .propose(approve_operator(), &Principal::new("mallory"), t(0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn threshold_of_one_approves_on_creation() {
        let mut gov = engine(1, 1, 1, 0);
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Approved);
    }

    #[test]
    fn approval_needs_threshold_distinct_signers() {
        let mut gov = engine(5, 3, 4, 0);
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        assert_eq!(gov.sign(id, &signer(2), t(1)).unwrap(), ProposalStatus::Pending);
        let err = gov.sign(id, &signer(2), t(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadySigned);
        assert_eq!(gov.sign(id, &signer(3), t(2)).unwrap(), ProposalStatus::Approved);
    }

    #[test]
    fn sign_errors() {
        let mut gov = engine(3, 2, 3, 0);
        assert_eq!(
            gov.sign(42, &signer(1), t(0)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        assert_eq!(
            gov.sign(id, &Principal::new("mallory"), t(0)).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        gov.sign(id, &signer(2), t(0)).unwrap();
        assert_eq!(
            gov.sign(id, &signer(3), t(0)).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn signing_closes_at_ttl() {
        let mut gov = engine(3, 2, 3, 0);
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        let err = gov.sign(id, &signer(2), t(1_000)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlinePassed);
    }

    #[test]
    fn supermajority_actions_snapshot_supermajority() {
        let mut gov = engine(5, 3, 4, 0);
        let id = gov
            .propose(Action::EmergencyPause { duration: 10 }, &signer(1), t(0))
            .unwrap();
        let p = gov.proposal(id).unwrap();
        assert!(p.supermajority);
        assert_eq!(p.required, 4);
    }

    #[test]
    fn pause_duration_is_bounded() {
        let mut gov = engine(3, 2, 3, 0);
        let err = gov
            .propose(Action::EmergencyPause { duration: 501 }, &signer(1), t(0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        let err = gov
            .propose(Action::EmergencyPause { duration: 0 }, &signer(1), t(0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    // ── Execution ────────────────────────────────────────────────────────

    #[test]
    fn three_of_five_with_timelock() {
        let mut gov = engine(5, 3, 4, 100);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        gov.sign(id, &signer(2), t(10)).unwrap();
        gov.sign(id, &signer(3), t(20)).unwrap();

        let err = gov.execute(id, t(50), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimelockActive);
        assert!(dispatcher.seen.is_empty());

        gov.execute(id, t(101), &mut dispatcher).unwrap();
        assert_eq!(dispatcher.seen, vec![(id, approve_operator())]);
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Executed);
        assert_eq!(gov.proposal(id).unwrap().executed_at, Some(t(101)));
    }

    #[test]
    fn execute_twice_fails_without_redispatch() {
        let mut gov = engine(1, 1, 1, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        gov.execute(id, t(0), &mut dispatcher).unwrap();
        let err = gov.execute(id, t(1), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(dispatcher.seen.len(), 1);
    }

    #[test]
    fn unapproved_proposal_cannot_execute() {
        let mut gov = engine(3, 2, 3, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        let err = gov.execute(id, t(5), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn failed_dispatch_keeps_proposal_approved() {
        let mut gov = engine(1, 1, 1, 0);
        let mut dispatcher = RecordingDispatcher {
            refuse: Some(ErrorKind::InsufficientFunds),
            ..Default::default()
        };
        let id = gov
            .propose(
                Action::Disburse {
                    action_id: 7,
                    tier: RiskTier::Elevated,
                },
                &signer(1),
                t(0),
            )
            .unwrap();
        let err = gov.execute(id, t(0), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Approved);

        dispatcher.refuse = None;
        gov.execute(id, t(1), &mut dispatcher).unwrap();
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Executed);
    }

    #[test]
    fn warrant_reports_supermajority() {
        struct Check;
        impl ActionDispatcher for Check {
            fn dispatch(&mut self, w: &Warrant, _: &Action) -> Result<(), DispatchError> {
                assert!(w.is_supermajority());
                assert_eq!(w.signatures(), 2);
                Ok(())
            }
        }
        let mut gov = engine(3, 1, 2, 0);
        let id = gov
            .propose(Action::EmergencyPause { duration: 5 }, &signer(1), t(0))
            .unwrap();
        gov.sign(id, &signer(2), t(0)).unwrap();
        gov.execute(id, t(0), &mut Check).unwrap();
    }

    // ── Internal actions ─────────────────────────────────────────────────

    #[test]
    fn add_signer_then_sign() {
        let mut gov = engine(3, 1, 2, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let newcomer = signer(9);
        let id = gov
            .propose(
                Action::AddSigner {
                    signer: newcomer.clone(),
                },
                &signer(1),
                t(0),
            )
            .unwrap();
        gov.execute(id, t(0), &mut dispatcher).unwrap();
        assert!(gov.is_signer(&newcomer));
        assert_eq!(gov.signer_count(), 4);
        assert!(dispatcher.seen.is_empty());

        let again = gov
            .propose(Action::AddSigner { signer: newcomer }, &signer(1), t(1))
            .unwrap();
        let err = gov.execute(again, t(1), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(gov.proposal(again).unwrap().status, ProposalStatus::Approved);
    }

    #[test]
    fn system_account_cannot_be_signer() {
        let mut gov = engine(3, 1, 2, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov
            .propose(
                Action::AddSigner {
                    signer: Principal::treasury(),
                },
                &signer(1),
                t(0),
            )
            .unwrap();
        let err = gov.execute(id, t(0), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn remove_signer_respects_minimum() {
        let mut gov = engine(3, 2, 3, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov
            .propose(Action::RemoveSigner { signer: signer(3) }, &signer(1), t(0))
            .unwrap();
        gov.sign(id, &signer(2), t(0)).unwrap();
        gov.sign(id, &signer(3), t(0)).unwrap();
        let err = gov.execute(id, t(0), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(gov.signer_count(), 3);
    }

    #[test]
    fn removed_signer_signatures_still_count() {
        let mut gov = engine(4, 2, 3, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let pending = gov.propose(approve_operator(), &signer(4), t(0)).unwrap();

        let removal = gov
            .propose(Action::RemoveSigner { signer: signer(4) }, &signer(1), t(0))
            .unwrap();
        gov.sign(removal, &signer(2), t(0)).unwrap();
        gov.sign(removal, &signer(3), t(0)).unwrap();
        gov.execute(removal, t(0), &mut dispatcher).unwrap();
        assert!(!gov.is_signer(&signer(4)));
        assert!(gov.signer_record(&signer(4)).unwrap().removed_at.is_some());

        assert_eq!(gov.sign(pending, &signer(1), t(1)).unwrap(), ProposalStatus::Approved);
        let err = gov.sign(removal, &signer(4), t(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn params_change_does_not_touch_existing_snapshots() {
        let mut gov = engine(5, 2, 3, 10);
        let mut dispatcher = RecordingDispatcher::default();
        let old = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();

        let change = gov
            .propose(
                Action::SetGovernanceParams {
                    params: params(4, 5, 50),
                },
                &signer(1),
                t(0),
            )
            .unwrap();
        gov.sign(change, &signer(2), t(0)).unwrap();
        gov.sign(change, &signer(3), t(0)).unwrap();
        gov.execute(change, t(10), &mut dispatcher).unwrap();
        assert_eq!(gov.params().threshold, 4);

        assert_eq!(gov.sign(old, &signer(2), t(11)).unwrap(), ProposalStatus::Approved);
        gov.execute(old, t(11), &mut dispatcher).unwrap();

        let new = gov.propose(approve_operator(), &signer(1), t(20)).unwrap();
        let p = gov.proposal(new).unwrap();
        assert_eq!(p.required, 4);
        assert_eq!(p.earliest_execution, t(70));
    }

    #[test]
    fn lowered_threshold_does_not_shortcut_existing_proposals() {
        let mut gov = engine(5, 3, 4, 10);
        let mut dispatcher = RecordingDispatcher::default();
        let old = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();

        let change = gov
            .propose(
                Action::SetGovernanceParams {
                    params: GovernanceParams {
                        cancel_quorum: 1,
                        ..params(2, 3, 10)
                    },
                },
                &signer(1),
                t(0),
            )
            .unwrap();
        for n in 2..=4 {
            gov.sign(change, &signer(n), t(0)).unwrap();
        }
        gov.execute(change, t(10), &mut dispatcher).unwrap();
        assert_eq!(gov.params().threshold, 2);

        // Two signatures meet the new threshold but not the snapshot of three.
        assert_eq!(gov.sign(old, &signer(2), t(11)).unwrap(), ProposalStatus::Pending);
        let err = gov.execute(old, t(11), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(dispatcher.seen.is_empty());

        assert_eq!(gov.sign(old, &signer(3), t(12)).unwrap(), ProposalStatus::Approved);
        gov.execute(old, t(12), &mut dispatcher).unwrap();
        assert_eq!(dispatcher.seen, vec![(old, approve_operator())]);
    }

    #[test]
    fn cancel_quorum_at_threshold_is_refused() {
        let mut gov = engine(5, 3, 4, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov
            .propose(
                Action::SetGovernanceParams {
                    params: GovernanceParams {
                        cancel_quorum: 5,
                        ..params(2, 3, 0)
                    },
                },
                &signer(1),
                t(0),
            )
            .unwrap();
        for n in 2..=4 {
            gov.sign(id, &signer(n), t(0)).unwrap();
        }
        let err = gov.execute(id, t(0), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Approved);
        assert_eq!(gov.params().cancel_quorum, 2);
    }

    #[test]
    fn invalid_params_are_rejected_at_execution() {
        let mut gov = engine(3, 1, 2, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov
            .propose(
                Action::SetGovernanceParams {
                    params: params(2, 4, 0),
                },
                &signer(1),
                t(0),
            )
            .unwrap();
        gov.sign(id, &signer(2), t(0)).unwrap();
        let err = gov.execute(id, t(0), &mut dispatcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(gov.params().threshold, 1);
    }

    // ── Cancellation and expiry ──────────────────────────────────────────

    #[test]
    fn proposer_cancels_alone() {
        let mut gov = engine(3, 2, 3, 0);
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        assert_eq!(gov.cancel(id, &signer(1), t(1)).unwrap(), CancelOutcome::Cancelled);
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Cancelled);
        assert_eq!(
            gov.sign(id, &signer(2), t(2)).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn cancel_quorum_needed_for_others() {
        let mut gov = engine(5, 3, 4, 100);
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        gov.sign(id, &signer(2), t(0)).unwrap();
        gov.sign(id, &signer(3), t(0)).unwrap();
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Approved);
        assert_eq!(
            gov.cancel(id, &signer(1), t(1)).unwrap(),
            CancelOutcome::VoteRecorded { votes: 1, needed: 2 }
        );
        assert_eq!(
            gov.cancel(id, &signer(1), t(1)).unwrap_err().kind(),
            ErrorKind::AlreadySigned
        );
        assert_eq!(gov.cancel(id, &signer(3), t(2)).unwrap(), CancelOutcome::Cancelled);
    }

    #[test]
    fn executed_proposal_cannot_be_cancelled() {
        let mut gov = engine(1, 1, 1, 0);
        let mut dispatcher = RecordingDispatcher::default();
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        gov.execute(id, t(0), &mut dispatcher).unwrap();
        let err = gov.cancel(id, &signer(1), t(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn stale_proposals_leave_active_set_then_expire() {
        let mut gov = engine(3, 2, 3, 0);
        let stale = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        let fresh = gov.propose(approve_operator(), &signer(2), t(500)).unwrap();

        let active: Vec<u64> = gov.active_proposals(t(1_000)).iter().map(|p| p.id).collect();
        assert_eq!(active, vec![fresh]);
        assert_eq!(gov.proposal(stale).unwrap().status, ProposalStatus::Pending);

        assert_eq!(gov.expire_stale(t(1_000)), vec![stale]);
        assert_eq!(gov.proposal(stale).unwrap().status, ProposalStatus::Expired);
        assert!(gov.expire_stale(t(1_000)).is_empty());
    }

    // ── Persistence ──────────────────────────────────────────────────────

    #[test]
    fn save_and_load_roundtrip() {
        let mut gov = engine(3, 2, 3, 5);
        let id = gov.propose(approve_operator(), &signer(1), t(0)).unwrap();
        gov.sign(id, &signer(2), t(1)).unwrap();

        let store = NullStore::new();
        gov.save_to_store(&store).unwrap();
        let mut loaded = GovernanceEngine::load_from_store(&store).unwrap();

        assert_eq!(loaded.proposal(id), gov.proposal(id));
        assert_eq!(loaded.params(), gov.params());
        assert_eq!(loaded.signer_count(), 3);
        let next = loaded.propose(approve_operator(), &signer(1), t(2)).unwrap();
        assert_eq!(next, id + 1);
    }

    #[test]
    fn load_from_empty_store_fails() {
        let store = NullStore::new();
        assert!(GovernanceEngine::load_from_store(&store).is_err());
    }
}
