//! Reward curve history and the pure reward function.

use concord_types::{Amount, ConsensusRecord, Principal, RewardCurve};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A reward curve and the first consensus sequence number it prices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveSegment {
    pub from_seq: u64,
    pub curve: RewardCurve,
}

/// Every reward curve ever in force, in sequence order.
///
/// A governance change appends one segment that applies to records
/// finalized after the change. Records already finalized keep the curve
/// they were finalized under, so a record's reward never changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveHistory {
    genesis: RewardCurve,
    changes: Vec<CurveSegment>,
}

impl CurveHistory {
    pub fn new(genesis: RewardCurve) -> Self {
        Self {
            genesis,
            changes: Vec::new(),
        }
    }

    /// Install `curve` for every record after `latest_seq`. Repeated changes
    /// with no record finalized in between replace one another.
    pub fn apply_change(&mut self, curve: RewardCurve, latest_seq: u64) {
        let from_seq = latest_seq.saturating_add(1);
        match self.changes.last_mut() {
            Some(last) if last.from_seq >= from_seq => last.curve = curve,
            None if latest_seq == 0 => self.genesis = curve,
            _ => self.changes.push(CurveSegment { from_seq, curve }),
        }
    }

    /// The curve that prices record `seq`.
    pub fn curve_for(&self, seq: u64) -> &RewardCurve {
        self.changes
            .iter()
            .rev()
            .find(|s| s.from_seq <= seq)
            .map_or(&self.genesis, |s| &s.curve)
    }

    pub fn current(&self) -> &RewardCurve {
        self.changes.last().map_or(&self.genesis, |s| &s.curve)
    }

    /// Changes after genesis, oldest first.
    pub fn changes(&self) -> &[CurveSegment] {
        &self.changes
    }
}

/// Rewards for every contributor in one record.
///
/// Each contributor earns `min(f(points) × per_point, cap)`; when the sum
/// exceeds the round budget every reward is scaled by `budget / sum`,
/// rounding down.
pub fn record_rewards(record: &ConsensusRecord, curve: &RewardCurve) -> BTreeMap<Principal, Amount> {
    let raw: BTreeMap<Principal, Amount> = record
        .value
        .iter()
        .map(|(contributor, points)| (contributor.clone(), curve.raw_reward(points)))
        .filter(|(_, reward)| !reward.is_zero())
        .collect();
    let total: Amount = raw.values().copied().sum();
    if total <= curve.round_budget {
        return raw;
    }
    raw.into_iter()
        .map(|(contributor, reward)| (contributor, scale(reward, curve.round_budget, total)))
        .collect()
}

/// One contributor's reward from one record.
pub fn reward_for(record: &ConsensusRecord, curve: &RewardCurve, contributor: &Principal) -> Amount {
    let points = record.value.points(contributor);
    if points == 0 {
        return Amount::ZERO;
    }
    record_rewards(record, curve)
        .get(contributor)
        .copied()
        .unwrap_or(Amount::ZERO)
}

/// `reward × budget / total`, rounding down. Rounds down further if the
/// product overflows; the scaled sum stays within the budget either way.
fn scale(reward: Amount, budget: Amount, total: Amount) -> Amount {
    match reward.raw().checked_mul(budget.raw()) {
        Some(product) => Amount::new(product / total.raw()),
        None => Amount::new(reward.raw() / total.raw().div_ceil(budget.raw())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_types::{ContributionReport, CurveKind, Digest, RoundId, Timestamp};

    fn record(seq: u64, value: ContributionReport) -> ConsensusRecord {
        ConsensusRecord {
            seq,
            round: RoundId::new("commits", seq),
            value,
            value_digest: Digest::ZERO,
            contributors: Vec::new(),
            finalized_at: Timestamp::new(seq),
        }
    }

    fn curve(per_point: u128, cap: u128, budget: u128) -> RewardCurve {
        RewardCurve {
            kind: CurveKind::Linear,
            per_point: Amount::new(per_point),
            cap_per_contributor: Amount::new(cap),
            round_budget: Amount::new(budget),
        }
    }

    #[test]
    fn rewards_under_budget_are_unscaled() {
        let r = record(1, ContributionReport::new().with("alice", 10).with("bob", 20));
        let rewards = record_rewards(&r, &curve(2, 1_000, 1_000));
        assert_eq!(rewards[&Principal::new("alice")], Amount::new(20));
        assert_eq!(rewards[&Principal::new("bob")], Amount::new(40));
    }

    #[test]
    fn cap_applies_before_budget() {
        let r = record(1, ContributionReport::new().with("alice", 10).with("bob", 500));
        let rewards = record_rewards(&r, &curve(1, 100, 1_000));
        assert_eq!(rewards[&Principal::new("bob")], Amount::new(100));
    }

    #[test]
    fn over_budget_scales_pro_rata() {
        let r = record(
            1,
            ContributionReport::new()
                .with("alice", 300)
                .with("bob", 600)
                .with("carol", 100),
        );
        let rewards = record_rewards(&r, &curve(1, 1_000, 500));
        assert_eq!(rewards[&Principal::new("alice")], Amount::new(150));
        assert_eq!(rewards[&Principal::new("bob")], Amount::new(300));
        assert_eq!(rewards[&Principal::new("carol")], Amount::new(50));
        let total: Amount = rewards.values().copied().sum();
        assert!(total <= Amount::new(500));
    }

    #[test]
    fn absent_contributor_earns_nothing() {
        let r = record(1, ContributionReport::new().with("alice", 10));
        assert_eq!(
            reward_for(&r, &curve(1, 100, 100), &Principal::new("bob")),
            Amount::ZERO
        );
    }

    #[test]
    fn history_prices_records_by_finalization() {
        let mut history = CurveHistory::new(curve(1, 100, 100));
        history.apply_change(curve(2, 100, 100), 3);
        assert_eq!(history.curve_for(3).per_point, Amount::new(1));
        assert_eq!(history.curve_for(4).per_point, Amount::new(2));
        assert_eq!(history.current().per_point, Amount::new(2));

        // A second change before any new record replaces the pending one.
        history.apply_change(curve(5, 100, 100), 3);
        assert_eq!(history.changes().len(), 1);
        assert_eq!(history.curve_for(4).per_point, Amount::new(5));
    }

    #[test]
    fn change_before_first_record_replaces_genesis_curve() {
        let mut history = CurveHistory::new(curve(1, 100, 100));
        history.apply_change(curve(3, 100, 100), 0);
        assert!(history.changes().is_empty());
        assert_eq!(history.curve_for(1).per_point, Amount::new(3));
    }
}
