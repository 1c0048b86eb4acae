use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use super::signature::Signature;

/// Size of an Ed25519 public key in bytes
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// Size of a private key in bytes: the 32-byte seed followed by the public key
pub const PRIVATE_KEY_LENGTH: usize = ed25519_dalek::KEYPAIR_LENGTH;

/// Errors that can occur while parsing keys or producing signatures
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("registry data too long, expected at most {max} bytes, got {len}")]
    DataTooLong { len: usize, max: usize },
    #[error("signing failed: {0}")]
    Signing(#[from] ed25519_dalek::SignatureError),
}

/// Public key identifying the owner of registry entries
///
/// Kept as the raw 32 bytes the portal sees. The bytes are only interpreted as
/// a curve point when verifying, so a key that is not a valid point simply
/// fails verification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        PublicKey(bytes)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = SignatureError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            SignatureError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(bytes.into())
    }
}

impl PublicKey {
    /// Parse a public key from a hexadecimal string
    ///
    /// Accepts plain hex as well as the `ed25519:` prefixed form used by portals.
    pub fn from_hex(hex: &str) -> Result<Self, SignatureError> {
        let hex = hex.strip_prefix("ed25519:").unwrap_or(hex);
        let mut buff = [0; PUBLIC_KEY_LENGTH];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|e| SignatureError::InvalidPublicKey(format!("hex decode error: {e}")))?;
        Ok(buff.into())
    }

    /// Convert public key to raw bytes
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0
    }

    /// Borrow the raw key bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Convert public key to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify an Ed25519 signature on a message.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The public key bytes are not a valid curve point
    /// - The signature verification fails
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;
        verifying_key
            .verify_strict(msg, &signature.to_dalek())
            .map_err(|e| SignatureError::InvalidSignature(e.to_string()))
    }
}

/// Private key used to sign registry entries
///
/// Never generated by the SDK; callers bring their own key material, either as
/// the 64-byte `seed || public key` form or as a bare 32-byte seed.
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&self.public()).finish()
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = SignatureError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: &[u8; PRIVATE_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            SignatureError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        // Rejects keys whose public half does not belong to the seed
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self(signing_key))
    }
}

impl SecretKey {
    /// Build a secret key from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(SigningKey::from_bytes(seed))
    }

    /// Parse a secret key from the 128-character hexadecimal keypair form
    pub fn from_hex(hex: &str) -> Result<Self, SignatureError> {
        let mut buff = [0; PRIVATE_KEY_LENGTH];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|e| SignatureError::InvalidPrivateKey(format!("hex decode error: {e}")))?;
        Self::try_from(buff.as_slice())
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }

    /// Convert secret key to the 64-byte keypair form
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.0.to_keypair_bytes()
    }

    /// Convert secret key to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Sign a message with this secret key using Ed25519.
    ///
    /// Returns a detached signature that can be verified with the corresponding public key.
    pub fn sign(&self, msg: &[u8]) -> Result<Signature, SignatureError> {
        let sig = self.0.try_sign(msg)?;
        Ok(Signature::from(sig.to_bytes()))
    }
}
