//! Encrypted metadata and memo types.
//!
//! Payloads here are produced and consumed by the cipher in `veilpay-crypto`;
//! this module only defines the shapes so the scanner and history crates can
//! carry them without depending on the crypto crate.

use serde::{Deserialize, Serialize};

use crate::types::keys::CompressedPublicKey;

/// AEAD-encrypted payload attached to a payment.
///
/// The ephemeral key here belongs to the encryption, not to the stealth
/// address derivation; a sender may reuse the announcement key or use a
/// fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMetadata {
    /// AES-256-GCM ciphertext including the authentication tag.
    pub encrypted_data: Vec<u8>,
    /// SEC1-compressed ECIES ephemeral public key.
    pub ephemeral_public_key: CompressedPublicKey,
    /// 96-bit GCM nonce, unique per message.
    pub nonce: Vec<u8>,
}

/// A human-readable memo travelling with a payment, serialized as JSON
/// before encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMemo {
    pub message: String,
    /// Unix milliseconds at memo creation.
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
}

impl TransactionMemo {
    pub fn new(message: impl Into<String>, timestamp: u64) -> Self {
        Self {
            message: message.into(),
            timestamp,
            sender_address: None,
            recipient_address: None,
        }
    }
}
