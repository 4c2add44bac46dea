//! Key types for Veilpay.
//!
//! This module defines the key structures used across the engine:
//!
//! - [`CompressedPublicKey`]: SEC1-compressed secp256k1 point (33 bytes)
//! - [`StealthPrivateKey`]: secp256k1 scalar (32 bytes, zeroized on drop)
//!
//! Curve validation (is this actually a point on secp256k1?) happens in
//! `veilpay-crypto`; these types only enforce size and encoding.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE};
use crate::error::{Result, VeilpayError};

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A SEC1-compressed secp256k1 public key.
///
/// Safe to share publicly. Used for spending keys, viewing keys and the
/// ephemeral keys published in announcements.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedPublicKey {
    bytes: [u8; COMPRESSED_PUBLIC_KEY_SIZE],
}

impl CompressedPublicKey {
    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    /// Returns error if length doesn't match `COMPRESSED_PUBLIC_KEY_SIZE` or
    /// the parity byte is not 0x02/0x03.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_PUBLIC_KEY_SIZE {
            return Err(VeilpayError::InvalidKeySize {
                expected: COMPRESSED_PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(VeilpayError::InvalidPublicKey(format!(
                "invalid SEC1 parity byte 0x{:02x}",
                bytes[0]
            )));
        }

        let mut arr = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a public key from a fixed-size array without parity checks.
    pub fn from_array(bytes: [u8; COMPRESSED_PUBLIC_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the hex-encoded public key with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Creates a public key from a hex string (with or without `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Returns true if every byte is zero (never a valid point).
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for CompressedPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CompressedPublicKey({}...{})",
            hex::encode(&self.bytes[..4]),
            hex::encode(&self.bytes[COMPRESSED_PUBLIC_KEY_SIZE - 4..])
        )
    }
}

impl std::fmt::Display for CompressedPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Serde implementation that uses hex encoding
impl Serialize for CompressedPublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CompressedPublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRIVATE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A secp256k1 private key (scalar).
///
/// This key is sensitive and will be automatically zeroized when dropped.
/// Never expose this key in logs or error messages; it deliberately has no
/// serde implementation.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct StealthPrivateKey {
    bytes: [u8; PRIVATE_KEY_SIZE],
}

impl StealthPrivateKey {
    /// Creates a private key from raw bytes.
    ///
    /// # Errors
    /// Returns error if length doesn't match `PRIVATE_KEY_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(VeilpayError::InvalidKeySize {
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let mut arr = [0u8; PRIVATE_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a private key from a fixed-size array.
    pub fn from_array(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a private key from a hex string (with or without `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw bytes of the private key.
    ///
    /// # Security
    /// Handle the returned bytes carefully - do not log or expose them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the private key as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for StealthPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose private key content
        write!(f, "StealthPrivateKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_from_bytes() {
        let mut bytes = [0x42u8; COMPRESSED_PUBLIC_KEY_SIZE];
        bytes[0] = 0x02;
        let pk = CompressedPublicKey::from_bytes(&bytes).unwrap();
        assert_eq!(pk.as_bytes(), &bytes);
    }

    #[test]
    fn test_public_key_wrong_size() {
        let bytes = [0u8; 20];
        let result = CompressedPublicKey::from_bytes(&bytes);
        assert!(matches!(result, Err(VeilpayError::InvalidKeySize { .. })));
    }

    #[test]
    fn test_public_key_bad_parity_byte() {
        let bytes = [0x04u8; COMPRESSED_PUBLIC_KEY_SIZE];
        let result = CompressedPublicKey::from_bytes(&bytes);
        assert!(matches!(result, Err(VeilpayError::InvalidPublicKey(_))));
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let mut bytes = [0xAB; COMPRESSED_PUBLIC_KEY_SIZE];
        bytes[0] = 0x03;
        let pk = CompressedPublicKey::from_bytes(&bytes).unwrap();
        let hex = pk.to_hex();
        assert!(hex.starts_with("0x"));
        let pk2 = CompressedPublicKey::from_hex(&hex).unwrap();
        assert_eq!(pk, pk2);
    }

    #[test]
    fn test_public_key_serde() {
        let mut bytes = [0x12; COMPRESSED_PUBLIC_KEY_SIZE];
        bytes[0] = 0x02;
        let pk = CompressedPublicKey::from_bytes(&bytes).unwrap();
        let json = serde_json::to_string(&pk).unwrap();
        let pk2: CompressedPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, pk2);
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let sk = StealthPrivateKey::from_array([7u8; PRIVATE_KEY_SIZE]);
        let debug = format!("{:?}", sk);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("07"));
    }

    #[test]
    fn test_private_key_hex_parsing() {
        let sk = StealthPrivateKey::from_hex(
            "0x0101010101010101010101010101010101010101010101010101010101010101",
        )
        .unwrap();
        assert_eq!(sk.as_bytes(), &[1u8; 32]);
    }
}
