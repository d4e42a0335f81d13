//! Nullable ledger: an in-memory [`FundTransfer`].

use concord_types::{Amount, FundTransfer, Principal, TransferError};
use std::collections::BTreeMap;

/// In-memory balances with atomic transfers.
#[derive(Clone, Debug, Default)]
pub struct NullLedger {
    balances: BTreeMap<Principal, Amount>,
    refuse: Option<String>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed balances, e.g. from genesis configuration.
    pub fn with_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (Principal, Amount)>,
    {
        Self {
            balances: balances.into_iter().collect(),
            refuse: None,
        }
    }

    /// Mint funds into an account.
    pub fn credit(&mut self, account: &Principal, amount: Amount) {
        let entry = self.balances.entry(account.clone()).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Make every subsequent transfer fail with `Rejected(reason)`.
    pub fn refuse_transfers(&mut self, reason: impl Into<String>) {
        self.refuse = Some(reason.into());
    }

    pub fn accept_transfers(&mut self) {
        self.refuse = None;
    }

    /// Sum of every balance. Transfers never change it.
    pub fn total_supply(&self) -> Amount {
        self.balances.values().copied().sum()
    }

    pub fn balances(&self) -> &BTreeMap<Principal, Amount> {
        &self.balances
    }
}

impl FundTransfer for NullLedger {
    fn balance(&self, account: &Principal) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if let Some(reason) = &self.refuse {
            return Err(TransferError::Rejected(reason.clone()));
        }
        let available = self.balance(from);
        let debited = available
            .checked_sub(amount)
            .ok_or_else(|| TransferError::Insufficient {
                account: from.clone(),
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(to.clone()))?;
        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        tracing::trace!(%from, %to, %amount, "ledger transfer");
        Ok(())
    }
}
