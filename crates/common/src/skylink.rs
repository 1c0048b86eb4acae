//! Skylinks: content addresses for files and registry entries.
//!
//! A skylink is a 2-byte bitfield followed by a 32-byte merkle root. Its string
//! form is 46 characters of unpadded URL-safe base64, optionally written as a
//! URI with the `sia://` prefix.
//!
//! Version 1 skylinks address immutable data. Version 2 skylinks ("entry links")
//! address a registry entry: their merkle root is derived from the owner's
//! public key and the hashed data key, so the link never changes when the
//! entry's content does.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::{BufMut, BytesMut};

use crate::crypto::{hash_all, hash_data_key, PublicKey, HASH_LENGTH, PUBLIC_KEY_LENGTH};
use crate::encoding::{encode_prefixed_bytes, ENCODED_NUMBER_SIZE};

/// URI scheme prefix for skylinks
pub const URI_SKYNET_PREFIX: &str = "sia://";
/// Length of a skylink encoded as base64
pub const BASE64_ENCODED_SKYLINK_SIZE: usize = 46;
/// Length of a raw skylink in bytes
pub const RAW_SKYLINK_SIZE: usize = 2 + HASH_LENGTH;

const SPECIFIER_LEN: usize = 16;
const ED25519_SPECIFIER: &str = "ed25519";

/// Errors that can occur when parsing a skylink
#[derive(Debug, thiserror::Error)]
pub enum SkylinkError {
    #[error("invalid skylink length, expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid skylink encoding: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported skylink version {0}")]
    UnsupportedVersion(u8),
}

/// A decoded skylink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Skylink {
    bitfield: u16,
    merkle_root: [u8; HASH_LENGTH],
}

impl Skylink {
    /// Build a skylink from its parts
    pub fn new(bitfield: u16, merkle_root: [u8; HASH_LENGTH]) -> Result<Self, SkylinkError> {
        let skylink = Self {
            bitfield,
            merkle_root,
        };
        match skylink.version() {
            1 | 2 => Ok(skylink),
            v => Err(SkylinkError::UnsupportedVersion(v)),
        }
    }

    /// Derive the v2 skylink addressing the registry entry of `public_key` under
    /// an already hashed data key (`tweak`).
    pub fn new_v2(public_key: &PublicKey, tweak: &[u8; HASH_LENGTH]) -> Self {
        const VERSION: u16 = 2;

        Self {
            bitfield: VERSION - 1,
            merkle_root: derive_registry_entry_id(public_key, tweak),
        }
    }

    /// Derive the entry link for `public_key` and an unhashed `data_key`.
    pub fn entry_link(public_key: &PublicKey, data_key: &str) -> Self {
        Self::new_v2(public_key, &hash_data_key(data_key))
    }

    /// Decode a skylink from its raw 34-byte form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SkylinkError> {
        if bytes.len() != RAW_SKYLINK_SIZE {
            return Err(SkylinkError::InvalidLength {
                expected: RAW_SKYLINK_SIZE,
                got: bytes.len(),
            });
        }
        let bitfield = u16::from_le_bytes([bytes[0], bytes[1]]);
        let mut merkle_root = [0; HASH_LENGTH];
        merkle_root.copy_from_slice(&bytes[2..]);
        Self::new(bitfield, merkle_root)
    }

    /// Encode the skylink in its raw 34-byte form
    pub fn to_bytes(&self) -> [u8; RAW_SKYLINK_SIZE] {
        let mut raw = [0; RAW_SKYLINK_SIZE];
        raw[..2].copy_from_slice(&self.bitfield.to_le_bytes());
        raw[2..].copy_from_slice(&self.merkle_root);
        raw
    }

    pub fn bitfield(&self) -> u16 {
        self.bitfield
    }

    pub fn merkle_root(&self) -> &[u8; HASH_LENGTH] {
        &self.merkle_root
    }

    /// The skylink version, stored in the two lowest bits of the bitfield
    pub fn version(&self) -> u8 {
        (self.bitfield & 0b11) as u8 + 1
    }

    /// Format the skylink as a `sia://` URI
    pub fn to_uri(&self) -> String {
        format!("{}{}", URI_SKYNET_PREFIX, self)
    }
}

impl fmt::Display for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.to_bytes()))
    }
}

impl FromStr for Skylink {
    type Err = SkylinkError;

    /// Parse a skylink, with or without the `sia://` prefix. Any path, query or
    /// fragment following the skylink is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (encoded, _) = split_skylink_path(s);
        if encoded.len() != BASE64_ENCODED_SKYLINK_SIZE {
            return Err(SkylinkError::InvalidLength {
                expected: BASE64_ENCODED_SKYLINK_SIZE,
                got: encoded.len(),
            });
        }
        let bytes = URL_SAFE_NO_PAD.decode(encoded)?;
        Self::from_bytes(&bytes)
    }
}

/// Strip the `sia://` prefix if present
pub fn trim_skylink_prefix(skylink: &str) -> &str {
    skylink.strip_prefix(URI_SKYNET_PREFIX).unwrap_or(skylink)
}

/// Split a skylink string into the encoded skylink and whatever follows it
/// (`/path`, `?query` or `#fragment`), with the `sia://` prefix removed.
pub fn split_skylink_path(skylink: &str) -> (&str, &str) {
    let trimmed = trim_skylink_prefix(skylink);
    match trimmed.find(|c: char| matches!(c, '/' | '?' | '#')) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    }
}

/// Matches `DeriveRegistryEntryID` on the network side.
fn derive_registry_entry_id(public_key: &PublicKey, tweak: &[u8; HASH_LENGTH]) -> [u8; HASH_LENGTH] {
    hash_all(&[&marshal_sia_public_key(public_key), tweak])
}

/// The network's encoding of a public key: a 16-byte algorithm specifier
/// followed by the length-prefixed key.
fn marshal_sia_public_key(public_key: &PublicKey) -> Vec<u8> {
    let mut encoded =
        BytesMut::with_capacity(SPECIFIER_LEN + ENCODED_NUMBER_SIZE + PUBLIC_KEY_LENGTH);
    encoded.put_slice(&new_specifier(ED25519_SPECIFIER));
    encoded.put_slice(&encode_prefixed_bytes(public_key.as_bytes()));
    encoded.to_vec()
}

/// Zero-pad `name` to a 16-byte specifier. Names longer than 16 bytes are
/// truncated; only fixed internal names are ever passed in.
fn new_specifier(name: &str) -> [u8; SPECIFIER_LEN] {
    let mut specifier = [0; SPECIFIER_LEN];
    let len = name.len().min(SPECIFIER_LEN);
    specifier[..len].copy_from_slice(&name.as_bytes()[..len]);
    specifier
}
