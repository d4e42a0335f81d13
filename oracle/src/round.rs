//! Data rounds, submissions and the stake-weighted tally.

use concord_types::{
    Amount, ContributionReport, Digest, OracleParams, Principal, RoundId, Timestamp,
    BPS_DENOMINATOR,
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Accepting commitments.
    Open,
    /// Accepting reveals.
    Closed,
    Finalized,
    Failed,
}

impl RoundPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Failed)
    }
}

/// A revealed value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    pub value: ContributionReport,
    pub digest: Digest,
    pub revealed_at: Timestamp,
}

/// One operator's participation in a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The operator's stake when it committed; the round's only weight.
    pub stake: Amount,
    pub commitment: Digest,
    pub committed_at: Timestamp,
    pub reveal: Option<Reveal>,
}

/// Why a round ended without consensus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    NoReveals,
    QuorumNotMet {
        reveals: u32,
        revealed_stake: Amount,
        committed_stake: Amount,
    },
    NoConsensus {
        winning_bps: u32,
    },
}

/// A single oracle data round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub opened_by: Principal,
    pub opened_at: Timestamp,
    pub commit_deadline: Timestamp,
    pub reveal_deadline: Timestamp,
    /// Persisted phase. Deadlines move a round along without a write, so
    /// use [`Round::phase_at`] for the phase in force.
    pub phase: RoundPhase,
    /// Parameters in force when the round opened.
    pub params: OracleParams,
    pub submissions: BTreeMap<Principal, Submission>,
    /// Sequence number of the consensus record, once finalized.
    pub consensus_seq: Option<u64>,
    pub failure: Option<FailureReason>,
}

impl Round {
    pub fn open(id: RoundId, opener: Principal, now: Timestamp, params: &OracleParams) -> Self {
        let commit_deadline = now.after(params.commit_duration);
        Self {
            id,
            opened_by: opener,
            opened_at: now,
            commit_deadline,
            reveal_deadline: commit_deadline.after(params.reveal_duration),
            phase: RoundPhase::Open,
            params: params.clone(),
            submissions: BTreeMap::new(),
            consensus_seq: None,
            failure: None,
        }
    }

    /// The phase in force at `now`.
    pub fn phase_at(&self, now: Timestamp) -> RoundPhase {
        if self.phase.is_terminal() {
            self.phase
        } else if now < self.commit_deadline {
            RoundPhase::Open
        } else {
            RoundPhase::Closed
        }
    }

    pub fn has_commitment_from(&self, operator: &Principal) -> bool {
        self.submissions.contains_key(operator)
    }

    /// Committed operators that never revealed.
    pub fn non_revealers(&self) -> impl Iterator<Item = &Principal> {
        self.submissions
            .iter()
            .filter(|(_, s)| s.reveal.is_none())
            .map(|(p, _)| p)
    }

    pub fn tally(&self) -> Tally {
        Tally::of(self)
    }
}

/// Stake-weighted summary of a round's reveals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tally {
    pub committed_stake: Amount,
    pub revealed_stake: Amount,
    pub reveals: u32,
    /// Revealed stake and operator count behind each distinct value.
    pub weights: BTreeMap<Digest, (Amount, u32)>,
}

impl Tally {
    pub fn of(round: &Round) -> Self {
        let mut tally = Self {
            committed_stake: Amount::ZERO,
            revealed_stake: Amount::ZERO,
            reveals: 0,
            weights: BTreeMap::new(),
        };
        for submission in round.submissions.values() {
            tally.committed_stake = tally.committed_stake.saturating_add(submission.stake);
            if let Some(reveal) = &submission.reveal {
                tally.revealed_stake = tally.revealed_stake.saturating_add(submission.stake);
                tally.reveals += 1;
                let entry = tally.weights.entry(reveal.digest).or_insert((Amount::ZERO, 0));
                entry.0 = entry.0.saturating_add(submission.stake);
                entry.1 += 1;
            }
        }
        tally
    }

    /// The stake-weighted mode. Ties go to the value with more operators,
    /// then to the smallest digest.
    pub fn leader(&self) -> Option<(Digest, Amount)> {
        self.weights
            .iter()
            .max_by_key(|(digest, (stake, count))| (*stake, *count, Reverse(**digest)))
            .map(|(digest, (stake, _))| (*digest, *stake))
    }

    /// Apply the quorum and consensus-threshold rules.
    pub fn decide(&self, params: &OracleParams) -> Result<Digest, FailureReason> {
        if self.reveals == 0 {
            return Err(FailureReason::NoReveals);
        }
        let quorum_met = self.reveals >= params.min_reveals
            && bps_at_least(
                self.revealed_stake,
                self.committed_stake,
                params.reveal_quorum_bps,
            );
        if !quorum_met {
            return Err(FailureReason::QuorumNotMet {
                reveals: self.reveals,
                revealed_stake: self.revealed_stake,
                committed_stake: self.committed_stake,
            });
        }
        let (digest, stake) = self.leader().ok_or(FailureReason::NoReveals)?;
        if !bps_at_least(stake, self.revealed_stake, params.consensus_threshold_bps) {
            return Err(FailureReason::NoConsensus {
                winning_bps: share_bps(stake, self.revealed_stake),
            });
        }
        Ok(digest)
    }
}

/// `part / whole ≥ bps / 10000`, without division.
fn bps_at_least(part: Amount, whole: Amount, bps: u32) -> bool {
    part.raw().saturating_mul(BPS_DENOMINATOR as u128) >= whole.raw().saturating_mul(bps as u128)
}

fn share_bps(part: Amount, whole: Amount) -> u32 {
    if whole.is_zero() {
        return 0;
    }
    (part.raw().saturating_mul(BPS_DENOMINATOR as u128) / whole.raw()) as u32
}
