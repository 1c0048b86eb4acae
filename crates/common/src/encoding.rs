//! Canonical binary encoding shared by hashing, signing and link derivation.
//!
//! Numbers are always 8 bytes little-endian, and variable-length values are
//! prefixed with their encoded length. The output never depends on the host's
//! byte order.

use bytes::{BufMut, BytesMut};

/// Size of an encoded number in bytes
pub const ENCODED_NUMBER_SIZE: usize = 8;

/// Encode a number as 8 little-endian bytes.
pub fn encode_number(num: u64) -> [u8; ENCODED_NUMBER_SIZE] {
    num.to_le_bytes()
}

/// Encode a byte slice prefixed with its length.
pub fn encode_prefixed_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut encoded = BytesMut::with_capacity(ENCODED_NUMBER_SIZE + bytes.len());
    encoded.put_u64_le(bytes.len() as u64);
    encoded.put_slice(bytes);
    encoded.to_vec()
}

/// Encode a string as its length-prefixed UTF-8 bytes.
pub fn encode_str(s: &str) -> Vec<u8> {
    encode_prefixed_bytes(s.as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode_number() {
        assert_eq!(encode_number(0), [0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_number(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_number(255), [255, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_number(256), [0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_number(u64::MAX), [255; 8]);
    }

    #[test]
    fn test_encode_str() {
        assert_eq!(encode_str(""), vec![0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            encode_str("skynet"),
            vec![6, 0, 0, 0, 0, 0, 0, 0, 115, 107, 121, 110, 101, 116]
        );
        // Length counts bytes, not characters
        assert_eq!(
            encode_str("żźć"),
            vec![6, 0, 0, 0, 0, 0, 0, 0, 197, 188, 197, 186, 196, 135]
        );
    }

    #[test]
    fn test_encode_prefixed_bytes() {
        assert_eq!(
            encode_prefixed_bytes(&[0xff, 0x0a]),
            vec![2, 0, 0, 0, 0, 0, 0, 0, 0xff, 0x0a]
        );
    }
}
