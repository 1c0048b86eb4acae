/**
 * Cryptographic types and operations.
 *  - BLAKE2b-256 hashing
 *  - Ed25519 keys and signatures
 */
pub mod crypto;
/**
 * Canonical little-endian, length-prefixed
 *  encoding used for everything we hash or sign.
 */
pub mod encoding;
/**
 * Signed registry entries and their
 *  canonical hash.
 */
pub mod registry;
/**
 * Skylink parsing, formatting and
 *  entry link derivation.
 */
pub mod skylink;

pub mod prelude {
    pub use crate::crypto::{
        PublicKey, SecretKey, Signature, SignatureError, HASH_LENGTH, PRIVATE_KEY_LENGTH,
        PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
    };
    pub use crate::registry::{EntryData, RegistryEntry, SignedRegistryEntry, MAX_REGISTRY_DATA_SIZE};
    pub use crate::skylink::{Skylink, SkylinkError, URI_SKYNET_PREFIX};
}
