//! Stealth meta-address types.
//!
//! A meta-address is the recipient's published identity: a spending public
//! key plus a viewing public key. Senders derive one-time stealth addresses
//! from it; the recipient scans with the viewing key and spends with the
//! spending key.

use serde::{Deserialize, Serialize};

use crate::constants::{COMPRESSED_PUBLIC_KEY_SIZE, META_ADDRESS_PREFIX};
use crate::error::{Result, VeilpayError};
use crate::types::keys::CompressedPublicKey;

// ═══════════════════════════════════════════════════════════════════════════════
// META-ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A stealth meta-address: the recipient's long-lived public identity.
///
/// String form is `st:eth:0x<spending_pk><viewing_pk>` with both keys
/// SEC1-compressed (33 bytes each, 132 hex characters total).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaAddress {
    /// Public key used to derive the one-time address the funds land on.
    pub spending_pk: CompressedPublicKey,
    /// Public key used by the sender for ECDH; its private half lets the
    /// recipient detect payments without being able to spend them.
    pub viewing_pk: CompressedPublicKey,
}

impl MetaAddress {
    /// Creates a meta-address from its two component keys.
    pub fn new(spending_pk: CompressedPublicKey, viewing_pk: CompressedPublicKey) -> Self {
        Self {
            spending_pk,
            viewing_pk,
        }
    }

    /// Encodes the meta-address as `st:eth:0x...`.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            META_ADDRESS_PREFIX,
            hex::encode(self.spending_pk.as_bytes()),
            hex::encode(self.viewing_pk.as_bytes())
        )
    }

    /// Parses a meta-address from its `st:eth:0x...` string form.
    ///
    /// # Errors
    /// Returns `InvalidMetaAddress` on a missing prefix, wrong length, or
    /// keys that are not valid compressed SEC1 encodings.
    pub fn decode(s: &str) -> Result<Self> {
        let body = s.strip_prefix(META_ADDRESS_PREFIX).ok_or_else(|| {
            VeilpayError::InvalidMetaAddress(format!(
                "missing '{}' prefix",
                META_ADDRESS_PREFIX
            ))
        })?;

        let expected_len = COMPRESSED_PUBLIC_KEY_SIZE * 2 * 2;
        if body.len() != expected_len {
            return Err(VeilpayError::InvalidMetaAddress(format!(
                "expected {} hex characters, got {}",
                expected_len,
                body.len()
            )));
        }

        let bytes = hex::decode(body)
            .map_err(|e| VeilpayError::InvalidMetaAddress(format!("invalid hex: {}", e)))?;

        let spending_pk = CompressedPublicKey::from_bytes(&bytes[..COMPRESSED_PUBLIC_KEY_SIZE])
            .map_err(|e| {
                VeilpayError::InvalidMetaAddress(format!("bad spending key: {}", e))
            })?;
        let viewing_pk = CompressedPublicKey::from_bytes(&bytes[COMPRESSED_PUBLIC_KEY_SIZE..])
            .map_err(|e| VeilpayError::InvalidMetaAddress(format!("bad viewing key: {}", e)))?;

        Ok(Self {
            spending_pk,
            viewing_pk,
        })
    }
}

impl std::fmt::Display for MetaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl std::str::FromStr for MetaAddress {
    type Err = VeilpayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key(parity: u8, fill: u8) -> CompressedPublicKey {
        let mut bytes = [fill; COMPRESSED_PUBLIC_KEY_SIZE];
        bytes[0] = parity;
        CompressedPublicKey::from_array(bytes)
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let meta = MetaAddress::new(sample_key(0x02, 0x11), sample_key(0x03, 0x22));
        let encoded = meta.encode();
        assert!(encoded.starts_with("st:eth:0x"));
        let decoded = MetaAddress::decode(&encoded).unwrap();
        assert_eq!(meta, decoded);
    }

    #[test]
    fn test_decode_missing_prefix() {
        let result = MetaAddress::decode("0xdeadbeef");
        assert!(matches!(result, Err(VeilpayError::InvalidMetaAddress(_))));
    }

    #[test]
    fn test_decode_wrong_length() {
        let result = MetaAddress::decode("st:eth:0xabcdef");
        assert!(matches!(result, Err(VeilpayError::InvalidMetaAddress(_))));
    }

    #[test]
    fn test_decode_bad_parity() {
        // 66 bytes of 0xff hex: fails SEC1 parity validation
        let body = "ff".repeat(COMPRESSED_PUBLIC_KEY_SIZE * 2);
        let result = MetaAddress::decode(&format!("st:eth:0x{}", body));
        assert!(matches!(result, Err(VeilpayError::InvalidMetaAddress(_))));
    }

    #[test]
    fn test_from_str() {
        let meta = MetaAddress::new(sample_key(0x03, 0xAA), sample_key(0x02, 0xBB));
        let parsed: MetaAddress = meta.encode().parse().unwrap();
        assert_eq!(meta, parsed);
    }

    proptest::proptest! {
        #[test]
        fn prop_encode_decode_roundtrip(
            spend in proptest::array::uniform32(0u8..),
            view in proptest::array::uniform32(0u8..),
            spend_parity in 2u8..=3,
            view_parity in 2u8..=3,
        ) {
            let mut s = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
            s[0] = spend_parity;
            s[1..].copy_from_slice(&spend);
            let mut v = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
            v[0] = view_parity;
            v[1..].copy_from_slice(&view);

            let meta = MetaAddress::new(
                CompressedPublicKey::from_array(s),
                CompressedPublicKey::from_array(v),
            );
            proptest::prop_assert_eq!(MetaAddress::decode(&meta.encode()).unwrap(), meta);
        }
    }
}
