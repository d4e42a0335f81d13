//! Blake2b-256 hashing.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};
use concord_types::Digest;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash `parts` into a [`Digest`].
pub fn digest_of(parts: &[&[u8]]) -> Digest {
    Digest::new(blake2b_256_multi(parts))
}

/// Lowercase hex of a digest, for logs and script output.
pub fn to_hex(digest: &Digest) -> String {
    hex::encode(digest.as_bytes())
}
