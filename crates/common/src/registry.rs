//! Registry entries: small, signed, mutable records.
//!
//! An entry is owned by an Ed25519 public key and addressed by the hash of its
//! data key. Each write carries a revision number that the registry requires to
//! strictly increase.
//!
//! # Signed encoding
//!
//! The signature covers the BLAKE2b-256 hash of
//!
//! ```text
//! hash_data_key(data_key) (32 bytes)
//! || len(data) (8 bytes, little-endian) || data
//! || revision (8 bytes, little-endian)
//! ```
//!
//! Every field is either fixed-size or length-prefixed, so no two entries share
//! a pre-image.

use serde::{Deserialize, Serialize};

use crate::crypto::{
    hash_all, hash_data_key, PublicKey, SecretKey, Signature, SignatureError, HASH_LENGTH,
};
use crate::encoding::{encode_number, encode_prefixed_bytes};

/// Maximum size of a registry entry's payload in bytes
pub const MAX_REGISTRY_DATA_SIZE: usize = 113;

/// Registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// The key of the data for the given entry.
    pub data_key: String,
    /// The data stored in the entry.
    pub data: Vec<u8>,
    /// The revision number for the entry.
    pub revision: u64,
}

impl RegistryEntry {
    pub fn new(data_key: impl Into<String>, data: impl Into<Vec<u8>>, revision: u64) -> Self {
        Self {
            data_key: data_key.into(),
            data: data.into(),
            revision,
        }
    }

    /// The hashed data key, as sent to the registry
    pub fn data_key_hash(&self) -> [u8; HASH_LENGTH] {
        hash_data_key(&self.data_key)
    }

    /// Check the payload fits in a registry entry
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.data.len() > MAX_REGISTRY_DATA_SIZE {
            return Err(SignatureError::DataTooLong {
                len: self.data.len(),
                max: MAX_REGISTRY_DATA_SIZE,
            });
        }
        Ok(())
    }

    /// The canonical bytes hashed for signing
    pub fn preimage(&self) -> Vec<u8> {
        registry_entry_preimage(&self.data_key_hash(), &self.data, self.revision)
    }

    /// The hash covered by the entry's signature
    pub fn hash(&self) -> [u8; HASH_LENGTH] {
        hash_all(&[&self.preimage()])
    }

    /// Sign the entry, consuming it into a [`SignedRegistryEntry`]
    pub fn sign(self, secret_key: &SecretKey) -> Result<SignedRegistryEntry, SignatureError> {
        let signature = sign(&self, secret_key)?;
        Ok(SignedRegistryEntry {
            entry: self,
            signature,
        })
    }
}

/// Signed registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRegistryEntry {
    /// The registry entry.
    pub entry: RegistryEntry,
    /// The signature of the registry entry.
    pub signature: Signature,
}

impl SignedRegistryEntry {
    /// Check the signature against the entry's owner
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verify(self, public_key)
    }
}

/// The payload of a registry entry together with its revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub data: Vec<u8>,
    pub revision: u64,
}

impl From<RegistryEntry> for EntryData {
    fn from(entry: RegistryEntry) -> Self {
        Self {
            data: entry.data,
            revision: entry.revision,
        }
    }
}

/// Build the signed pre-image from an already hashed data key.
///
/// Portals only ever see the data key hash, so this is the form a registry
/// uses to check signatures.
pub fn registry_entry_preimage(
    data_key_hash: &[u8; HASH_LENGTH],
    data: &[u8],
    revision: u64,
) -> Vec<u8> {
    let data = encode_prefixed_bytes(data);
    let revision = encode_number(revision);

    let mut preimage = Vec::with_capacity(HASH_LENGTH + data.len() + revision.len());
    preimage.extend_from_slice(data_key_hash);
    preimage.extend_from_slice(&data);
    preimage.extend_from_slice(&revision);
    preimage
}

/// Hash a registry entry given its hashed data key.
pub fn hash_registry_entry(
    data_key_hash: &[u8; HASH_LENGTH],
    data: &[u8],
    revision: u64,
) -> [u8; HASH_LENGTH] {
    hash_all(&[&registry_entry_preimage(data_key_hash, data, revision)])
}

/// Sign `entry` with `secret_key`.
pub fn sign(entry: &RegistryEntry, secret_key: &SecretKey) -> Result<Signature, SignatureError> {
    entry.validate()?;
    secret_key.sign(&entry.hash())
}

/// Verify `signed` against `public_key`. Any mismatch, including a public key
/// that is not a valid curve point, yields `false`.
pub fn verify(signed: &SignedRegistryEntry, public_key: &PublicKey) -> bool {
    public_key
        .verify(&signed.entry.hash(), &signed.signature)
        .is_ok()
}
