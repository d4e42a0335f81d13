//! The treasury manager.

use concord_governance::{Governed, PauseState, Warrant};
use concord_store::{MetaStore, StoreError, TreasuryStore};
use concord_types::{Amount, FundTransfer, Principal, RiskTier, Timestamp, TreasuryParams};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::action::{ActionStatus, ApprovalPath, TreasuryAction};
use crate::error::TreasuryError;

const PARAMS_KEY: &str = "treasury.params";
const NEXT_ID_KEY: &str = "treasury.next_id";
const PAUSE_KEY: &str = "treasury.pause";
const DIRECT_SIGNERS_KEY: &str = "treasury.direct_signers";

/// Tracks disbursement proposals and pays them out of the treasury account.
pub struct TreasuryManager {
    params: TreasuryParams,
    direct_signers: BTreeSet<Principal>,
    actions: BTreeMap<u64, TreasuryAction>,
    next_id: u64,
    pause: PauseState,
}

impl TreasuryManager {
    pub fn new(
        params: TreasuryParams,
        direct_signers: impl IntoIterator<Item = Principal>,
    ) -> Result<Self, TreasuryError> {
        params.validate()?;
        Ok(Self {
            params,
            direct_signers: direct_signers.into_iter().collect(),
            actions: BTreeMap::new(),
            next_id: 1,
            pause: PauseState::default(),
        })
    }

    /// Credit the treasury account from `from`.
    pub fn deposit(
        &mut self,
        from: &Principal,
        amount: Amount,
        ledger: &mut dyn FundTransfer,
    ) -> Result<Amount, TreasuryError> {
        if !from.is_valid_caller() {
            return Err(TreasuryError::InvalidCaller(from.clone()));
        }
        if amount.is_zero() {
            return Err(TreasuryError::ZeroAmount);
        }
        ledger.transfer(from, &Principal::treasury(), amount)?;
        let balance = ledger.balance(&Principal::treasury());
        tracing::info!(from = %from, %amount, %balance, "treasury deposit");
        Ok(balance)
    }

    /// Record a disbursement request and classify it.
    pub fn propose_disbursement(
        &mut self,
        proposer: &Principal,
        amount: Amount,
        destination: &Principal,
        now: Timestamp,
    ) -> Result<u64, TreasuryError> {
        if !proposer.is_valid_caller() {
            return Err(TreasuryError::InvalidCaller(proposer.clone()));
        }
        if amount.is_zero() {
            return Err(TreasuryError::ZeroAmount);
        }
        if destination.as_str().is_empty() || *destination == Principal::treasury() {
            return Err(TreasuryError::InvalidDestination(destination.clone()));
        }

        let id = self.next_id;
        self.next_id += 1;
        let tier = self.params.tier_for(amount);
        self.actions.insert(
            id,
            TreasuryAction {
                id,
                amount,
                destination: destination.clone(),
                tier,
                path: ApprovalPath::from(tier),
                proposer: proposer.clone(),
                status: ActionStatus::Proposed,
                created_at: now,
                settled_at: None,
            },
        );
        tracing::info!(id, %amount, destination = %destination, ?tier, "disbursement proposed");
        Ok(id)
    }

    /// Settle a Direct-tier disbursement on a direct signer's authority.
    ///
    /// The tier is re-evaluated against the current brackets; an action that
    /// no longer fits the direct ceiling needs governance. Direct payouts may
    /// not take the balance below the reserve and are refused while paused.
    pub fn execute_direct(
        &mut self,
        id: u64,
        signer: &Principal,
        now: Timestamp,
        ledger: &mut dyn FundTransfer,
    ) -> Result<(), TreasuryError> {
        if !self.direct_signers.contains(signer) {
            return Err(TreasuryError::NotDirectSigner(signer.clone()));
        }
        if let Some(until) = self.pause.until().filter(|_| self.pause.is_active(now)) {
            return Err(TreasuryError::Paused(until));
        }
        let action = self.pending(id)?;
        let tier = action.tier.max(self.params.tier_for(action.amount));
        if tier.requires_governance() {
            return Err(TreasuryError::TierExceedsDirectAuthority { id, tier });
        }
        let balance = ledger.balance(&Principal::treasury());
        let remaining = balance.checked_sub(action.amount);
        if remaining.is_some_and(|left| left < self.params.min_reserve) {
            return Err(TreasuryError::ReserveBreached {
                amount: action.amount,
                balance,
                reserve: self.params.min_reserve,
            });
        }
        self.settle(id, now, ledger)
    }

    /// Settle a disbursement named by an executed `Disburse` action. Runs
    /// while paused and may dip into the reserve.
    pub fn execute_governed(
        &mut self,
        warrant: &Warrant,
        id: u64,
        tier: RiskTier,
        now: Timestamp,
        ledger: &mut dyn FundTransfer,
    ) -> Result<(), TreasuryError> {
        let action = self.pending(id)?;
        if action.tier != tier {
            return Err(TreasuryError::TierMismatch {
                id,
                actual: action.tier,
                named: tier,
            });
        }
        let current = action.tier.max(self.params.tier_for(action.amount));
        if current.requires_supermajority() && !warrant.is_supermajority() {
            return Err(TreasuryError::SupermajorityRequired { id, tier: current });
        }
        self.settle(id, now, ledger)
    }

    /// The one payout routine behind both approval paths.
    fn settle(
        &mut self,
        id: u64,
        now: Timestamp,
        ledger: &mut dyn FundTransfer,
    ) -> Result<(), TreasuryError> {
        let action = self.pending(id)?;
        let (amount, destination) = (action.amount, action.destination.clone());
        let available = ledger.balance(&Principal::treasury());
        if available < amount {
            return Err(TreasuryError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        ledger.transfer(&Principal::treasury(), &destination, amount)?;

        if let Some(action) = self.actions.get_mut(&id) {
            action.status = ActionStatus::Executed;
            action.settled_at = Some(now);
        }
        tracing::info!(
            id,
            %amount,
            destination = %destination,
            remaining = %available.saturating_sub(amount),
            "disbursement settled"
        );
        Ok(())
    }

    /// Withdraw a pending disbursement. Only its proposer may.
    pub fn cancel_disbursement(
        &mut self,
        id: u64,
        caller: &Principal,
        now: Timestamp,
    ) -> Result<(), TreasuryError> {
        let action = self.pending(id)?;
        if action.proposer != *caller {
            return Err(TreasuryError::NotProposer {
                id,
                caller: caller.clone(),
            });
        }
        if let Some(action) = self.actions.get_mut(&id) {
            action.status = ActionStatus::Cancelled;
            action.settled_at = Some(now);
        }
        tracing::info!(id, caller = %caller, "disbursement cancelled");
        Ok(())
    }

    pub fn add_direct_signer(
        &mut self,
        _warrant: &Warrant,
        signer: &Principal,
    ) -> Result<(), TreasuryError> {
        if !signer.is_valid_caller() {
            return Err(TreasuryError::InvalidCaller(signer.clone()));
        }
        if !self.direct_signers.insert(signer.clone()) {
            return Err(TreasuryError::DirectSignerExists(signer.clone()));
        }
        tracing::info!(signer = %signer, "direct signer added");
        Ok(())
    }

    pub fn remove_direct_signer(
        &mut self,
        _warrant: &Warrant,
        signer: &Principal,
    ) -> Result<(), TreasuryError> {
        if !self.direct_signers.remove(signer) {
            return Err(TreasuryError::DirectSignerNotFound(signer.clone()));
        }
        tracing::info!(signer = %signer, "direct signer removed");
        Ok(())
    }

    pub fn set_params(
        &mut self,
        _warrant: &Warrant,
        params: TreasuryParams,
    ) -> Result<(), TreasuryError> {
        params.validate()?;
        tracing::info!(
            direct_ceiling = %params.direct_ceiling,
            elevated_ceiling = %params.elevated_ceiling,
            min_reserve = %params.min_reserve,
            "treasury params updated"
        );
        self.params = params;
        Ok(())
    }

    fn pending(&self, id: u64) -> Result<&TreasuryAction, TreasuryError> {
        let action = self
            .actions
            .get(&id)
            .ok_or(TreasuryError::ActionNotFound(id))?;
        if !action.is_pending() {
            return Err(TreasuryError::WrongStatus {
                id,
                status: action.status,
            });
        }
        Ok(action)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn action(&self, id: u64) -> Option<&TreasuryAction> {
        self.actions.get(&id)
    }

    pub fn actions(&self) -> impl Iterator<Item = &TreasuryAction> {
        self.actions.values()
    }

    pub fn pending_actions(&self) -> impl Iterator<Item = &TreasuryAction> {
        self.actions.values().filter(|a| a.is_pending())
    }

    pub fn is_direct_signer(&self, principal: &Principal) -> bool {
        self.direct_signers.contains(principal)
    }

    pub fn direct_signers(&self) -> impl Iterator<Item = &Principal> {
        self.direct_signers.iter()
    }

    pub fn params(&self) -> &TreasuryParams {
        &self.params
    }

    // ── Persistence ──────────────────────────────────────────────────────

    pub fn save_to_store<S>(&self, store: &S) -> Result<(), TreasuryError>
    where
        S: TreasuryStore + MetaStore + ?Sized,
    {
        store
            .put_meta(PARAMS_KEY, &encode(&self.params)?)
            .map_err(storage)?;
        store
            .put_meta(NEXT_ID_KEY, &self.next_id.to_be_bytes())
            .map_err(storage)?;
        store
            .put_meta(PAUSE_KEY, &encode(&self.pause)?)
            .map_err(storage)?;
        store
            .put_meta(DIRECT_SIGNERS_KEY, &encode(&self.direct_signers)?)
            .map_err(storage)?;
        for (id, action) in &self.actions {
            store.put_action(*id, &encode(action)?).map_err(storage)?;
        }
        Ok(())
    }

    pub fn load_from_store<S>(store: &S) -> Result<Self, TreasuryError>
    where
        S: TreasuryStore + MetaStore + ?Sized,
    {
        let params = match store.get_meta(PARAMS_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(TreasuryError::Storage("missing treasury params".into())),
        };
        let direct_signers = match store.get_meta(DIRECT_SIGNERS_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => BTreeSet::new(),
        };
        let pause = match store.get_meta(PAUSE_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => PauseState::default(),
        };
        let mut actions = BTreeMap::new();
        for (id, bytes) in store.iter_actions().map_err(storage)? {
            actions.insert(id, decode(&bytes)?);
        }
        let next_id = match store.get_meta(NEXT_ID_KEY).map_err(storage)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| TreasuryError::Storage("corrupt action counter".into()))?;
                u64::from_be_bytes(raw)
            }
            None => actions.keys().next_back().map_or(1, |last| last + 1),
        };
        Ok(Self {
            params,
            direct_signers,
            actions,
            next_id,
            pause,
        })
    }
}

impl Governed for TreasuryManager {
    fn pause(&mut self, warrant: &Warrant, until: Timestamp) -> bool {
        let engaged = self.pause.engage(warrant, until);
        if engaged {
            tracing::warn!(%until, "direct disbursements paused");
        }
        engaged
    }

    fn lift_pause(&mut self, warrant: &Warrant) {
        self.pause.lift(warrant);
        tracing::info!("direct disbursements resumed");
    }

    fn paused_until(&self) -> Option<Timestamp> {
        self.pause.until()
    }
}

fn storage(e: StoreError) -> TreasuryError {
    TreasuryError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TreasuryError> {
    bincode::serialize(value).map_err(|e| TreasuryError::Storage(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TreasuryError> {
    bincode::deserialize(bytes).map_err(|e| TreasuryError::Storage(e.to_string()))
}
