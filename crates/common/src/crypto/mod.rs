//! Cryptographic primitives for the Skynet registry
//!
//! - **Hashing**: BLAKE2b-256 over canonically encoded values, used for data keys,
//!   registry entries and entry links
//! - **Identity**: Ed25519 keypairs own registry entries; the public key is part
//!   of every registry lookup
//! - **Authentication**: every registry entry carries a detached Ed25519 signature
//!   over its hash
//!
//! Keys, signatures and hashes are distinct fixed-size types so they cannot be
//! mixed up at compile time.

mod hash;
mod keys;
mod signature;

pub use hash::{hash_all, hash_data_key, HASH_LENGTH};
pub use keys::{PublicKey, SecretKey, SignatureError, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};
pub use signature::{Signature, SIGNATURE_LENGTH};
