//! The reward controller: claim bookkeeping and payouts.

use concord_governance::{Governed, PauseState, Warrant};
use concord_store::{ClaimStore, MetaStore, StoreError};
use concord_types::{Amount, FundTransfer, Oracle, Principal, RewardCurve, Timestamp};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

use crate::claim::{ClaimReceipt, ClaimRecord};
use crate::curve::{reward_for, CurveHistory};
use crate::error::RewardError;

/// Rewarding records one claim may collect.
pub const DEFAULT_MAX_RECORDS_PER_CLAIM: usize = 64;

/// Records one claim may walk, paying or not, for each rewarding record it
/// may collect.
pub const SCAN_WINDOW_PER_RECORD: usize = 8;

const CURVES_KEY: &str = "rewards.curves";
const PAUSE_KEY: &str = "rewards.pause";

/// Result of scanning the consensus log for one contributor.
struct Scan {
    amount: Amount,
    rewarded_records: usize,
    scanned: usize,
    through_seq: u64,
    /// Stopped at the scan window with records possibly left behind.
    window_full: bool,
}

pub struct RewardController {
    curves: CurveHistory,
    claims: BTreeMap<Principal, ClaimRecord>,
    max_records_per_claim: usize,
    pause: PauseState,
}

impl RewardController {
    pub fn new(curve: RewardCurve, max_records_per_claim: usize) -> Result<Self, RewardError> {
        curve.validate()?;
        Ok(Self {
            curves: CurveHistory::new(curve),
            claims: BTreeMap::new(),
            max_records_per_claim: max_records_per_claim.max(1),
            pause: PauseState::default(),
        })
    }

    /// Pay `contributor` everything earned since its last claim, up to the
    /// per-call bounds.
    ///
    /// Fails with `NothingToClaim`, leaving all state untouched, when the
    /// rest of the log pays it nothing. A scan window that fills without
    /// paying anything still moves the cursor past those records, so the
    /// next call starts where this one stopped.
    pub fn claim(
        &mut self,
        contributor: &Principal,
        now: Timestamp,
        oracle: &dyn Oracle,
        ledger: &mut dyn FundTransfer,
    ) -> Result<ClaimReceipt, RewardError> {
        if !contributor.is_valid_caller() {
            return Err(RewardError::InvalidCaller(contributor.clone()));
        }
        if let Some(until) = self.pause.until().filter(|_| self.pause.is_active(now)) {
            return Err(RewardError::Paused(until));
        }

        let scan = self.scan(contributor, oracle);
        if scan.amount.is_zero() && !scan.window_full {
            return Err(RewardError::NothingToClaim(contributor.clone()));
        }
        if !scan.amount.is_zero() {
            ledger.transfer(&Principal::reward_pool(), contributor, scan.amount)?;
        }

        let record = self
            .claims
            .entry(contributor.clone())
            .or_insert_with(|| ClaimRecord::new(contributor.clone()));
        record.total_claimed = record.total_claimed.saturating_add(scan.amount);
        record.last_claimed_round = scan.through_seq;
        record.last_claimed_at = Some(now);

        if scan.amount.is_zero() {
            tracing::debug!(
                contributor = %contributor,
                scanned = scan.scanned,
                through_seq = scan.through_seq,
                "claim window held no rewards"
            );
        } else {
            tracing::info!(
                contributor = %contributor,
                amount = %scan.amount,
                records = scan.rewarded_records,
                through_seq = scan.through_seq,
                total_claimed = %record.total_claimed,
                "claim paid"
            );
        }
        Ok(ClaimReceipt {
            amount: scan.amount,
            rewarded_records: scan.rewarded_records,
            through_seq: scan.through_seq,
        })
    }

    /// What a claim made now would pay.
    pub fn pending(&self, contributor: &Principal, oracle: &dyn Oracle) -> Amount {
        self.scan(contributor, oracle).amount
    }

    /// Walk records after the contributor's cursor until
    /// `max_records_per_claim` of them have paid something, the scan window
    /// is used up, or the log ends.
    fn scan(&self, contributor: &Principal, oracle: &dyn Oracle) -> Scan {
        let start = self
            .claims
            .get(contributor)
            .map_or(0, |r| r.last_claimed_round);
        let window = self.scan_window();
        let mut scan = Scan {
            amount: Amount::ZERO,
            rewarded_records: 0,
            scanned: 0,
            through_seq: start,
            window_full: false,
        };
        loop {
            let page = oracle.consensus_after(scan.through_seq, self.max_records_per_claim);
            if page.is_empty() {
                return scan;
            }
            for record in page {
                scan.through_seq = record.seq;
                scan.scanned += 1;
                let reward = reward_for(&record, self.curves.curve_for(record.seq), contributor);
                if !reward.is_zero() {
                    scan.amount = scan.amount.saturating_add(reward);
                    scan.rewarded_records += 1;
                    if scan.rewarded_records == self.max_records_per_claim {
                        return scan;
                    }
                }
                if scan.scanned >= window {
                    scan.window_full = true;
                    return scan;
                }
            }
        }
    }

    /// Most records one claim walks.
    pub fn scan_window(&self) -> usize {
        self.max_records_per_claim
            .saturating_mul(SCAN_WINDOW_PER_RECORD)
    }

    /// Install a new curve for records finalized from now on.
    pub fn set_curve(
        &mut self,
        _warrant: &Warrant,
        curve: RewardCurve,
        oracle: &dyn Oracle,
    ) -> Result<(), RewardError> {
        curve.validate()?;
        let latest = oracle.latest_seq();
        tracing::info!(
            kind = ?curve.kind,
            per_point = %curve.per_point,
            round_budget = %curve.round_budget,
            from_seq = latest.saturating_add(1),
            "reward curve updated"
        );
        self.curves.apply_change(curve, latest);
        Ok(())
    }

    pub fn claim_record(&self, contributor: &Principal) -> Option<&ClaimRecord> {
        self.claims.get(contributor)
    }

    pub fn claim_records(&self) -> impl Iterator<Item = &ClaimRecord> {
        self.claims.values()
    }

    pub fn curve(&self) -> &RewardCurve {
        self.curves.current()
    }

    pub fn curves(&self) -> &CurveHistory {
        &self.curves
    }

    // ── Persistence ──────────────────────────────────────────────────────

    pub fn save_to_store<S>(&self, store: &S) -> Result<(), RewardError>
    where
        S: ClaimStore + MetaStore + ?Sized,
    {
        store
            .put_meta(CURVES_KEY, &encode(&self.curves)?)
            .map_err(storage)?;
        store
            .put_meta(PAUSE_KEY, &encode(&self.pause)?)
            .map_err(storage)?;
        for (contributor, record) in &self.claims {
            store
                .put_claim(contributor, &encode(record)?)
                .map_err(storage)?;
        }
        Ok(())
    }

    pub fn load_from_store<S>(store: &S, max_records_per_claim: usize) -> Result<Self, RewardError>
    where
        S: ClaimStore + MetaStore + ?Sized,
    {
        let curves = match store.get_meta(CURVES_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(RewardError::Storage("missing reward curves".into())),
        };
        let pause = match store.get_meta(PAUSE_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes)?,
            None => PauseState::default(),
        };
        let mut claims = BTreeMap::new();
        for (contributor, bytes) in store.iter_claims().map_err(storage)? {
            claims.insert(contributor, decode(&bytes)?);
        }
        Ok(Self {
            curves,
            claims,
            max_records_per_claim: max_records_per_claim.max(1),
            pause,
        })
    }
}

impl Governed for RewardController {
    fn pause(&mut self, warrant: &Warrant, until: Timestamp) -> bool {
        let engaged = self.pause.engage(warrant, until);
        if engaged {
            tracing::warn!(%until, "claims paused");
        }
        engaged
    }

    fn lift_pause(&mut self, warrant: &Warrant) {
        self.pause.lift(warrant);
        tracing::info!("claims resumed");
    }

    fn paused_until(&self) -> Option<Timestamp> {
        self.pause.until()
    }
}

fn storage(e: StoreError) -> RewardError {
    RewardError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RewardError> {
    bincode::serialize(value).map_err(|e| RewardError::Storage(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RewardError> {
    bincode::deserialize(bytes).map_err(|e| RewardError::Storage(e.to_string()))
}
