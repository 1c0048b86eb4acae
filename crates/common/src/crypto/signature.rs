use std::fmt;

use serde::{Deserialize, Serialize};

use super::keys::SignatureError;

/// Size of an Ed25519 signature in bytes
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Detached Ed25519 signature over a registry entry hash
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_bytes")] [u8; SIGNATURE_LENGTH]);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl From<[u8; SIGNATURE_LENGTH]> for Signature {
    fn from(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Signature(bytes)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = SignatureError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            SignatureError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(bytes.into())
    }
}

impl Signature {
    /// Parse a signature from a hexadecimal string
    pub fn from_hex(hex: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(hex)
            .map_err(|e| SignatureError::InvalidSignature(format!("hex decode error: {e}")))?;
        Self::try_from(bytes.as_slice())
    }

    /// Convert signature to raw bytes
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0
    }

    /// Convert signature to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn to_dalek(self) -> ed25519_dalek::Signature {
        ed25519_dalek::Signature::from_bytes(&self.0)
    }
}

// serde only derives array impls up to 32 elements
mod signature_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::SIGNATURE_LENGTH;

    pub fn serialize<S: Serializer>(
        bytes: &[u8; SIGNATURE_LENGTH],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u8; SIGNATURE_LENGTH], D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        bytes.as_slice().try_into().map_err(|_| {
            serde::de::Error::invalid_length(bytes.len(), &"a 64-byte signature")
        })
    }
}
