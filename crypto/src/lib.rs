//! Cryptographic primitives for the Concord DAO core.
//!
//! - **Blake2b-256** for every digest
//! - Domain-separated commitments for the oracle commit/reveal protocol

pub mod commit;
pub mod hash;

pub use commit::Blake2bCommitHasher;
pub use hash::{blake2b_256, blake2b_256_multi, digest_of, to_hex};
