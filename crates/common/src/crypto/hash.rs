use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::encoding::encode_str;

/// Size of a BLAKE2b-256 hash in bytes
pub const HASH_LENGTH: usize = 32;

type Blake2b256 = Blake2b<U32>;

/// Hash the concatenation of all `parts` with BLAKE2b-256.
pub fn hash_all(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash a registry data key. The registry only ever sees this hash, never the
/// data key itself.
pub fn hash_data_key(data_key: &str) -> [u8; HASH_LENGTH] {
    hash_all(&[&encode_str(data_key)])
}
