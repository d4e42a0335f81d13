//! Commit/reveal hashing.
//!
//! A commitment is `H(tag ‖ round ‖ operator ‖ salt ‖ value)`, where every
//! variable-length part is length-prefixed. Binding the round and operator
//! into the hash means a commitment copied from another operator, or replayed
//! from another round, can never be revealed.

use concord_types::{CommitHasher, ContributionReport, Digest, Principal, RoundId};

use crate::hash::digest_of;

const COMMIT_TAG: &[u8] = b"concord/commit/v1";
const VALUE_TAG: &[u8] = b"concord/value/v1";

/// The default [`CommitHasher`], backed by Blake2b-256.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake2bCommitHasher;

impl CommitHasher for Blake2bCommitHasher {
    fn commitment(
        &self,
        round: &RoundId,
        operator: &Principal,
        salt: &[u8],
        value: &ContributionReport,
    ) -> Digest {
        let round_bytes = round.canonical_bytes();
        let operator_bytes = operator.as_str().as_bytes();
        let value_bytes = value.canonical_bytes();
        digest_of(&[
            COMMIT_TAG,
            &round_bytes,
            &(operator_bytes.len() as u32).to_be_bytes(),
            operator_bytes,
            &(salt.len() as u32).to_be_bytes(),
            salt,
            &value_bytes,
        ])
    }

    fn value_digest(&self, value: &ContributionReport) -> Digest {
        digest_of(&[VALUE_TAG, &value.canonical_bytes()])
    }
}
