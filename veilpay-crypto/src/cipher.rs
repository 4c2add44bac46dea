//! Authenticated metadata encryption.
//!
//! ECIES over the stealth viewing key: the sender draws a fresh ephemeral
//! keypair, derives the shared-secret digest with the recipient's viewing
//! public key, and uses it as an AES-256-GCM key. The recipient recovers
//! the key from the attached ephemeral public key and their viewing private
//! key.
//!
//! GCM authenticates the ciphertext, so tampering or a wrong key surfaces
//! as `DecryptionFailed` rather than garbage plaintext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use k256::SecretKey;

use veilpay_core::constants::GCM_NONCE_SIZE;
use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::{
    CompressedPublicKey, EncryptedMetadata, StealthPrivateKey, TransactionMemo,
};

use crate::curve::{compress_public_key, parse_public_key, parse_secret_key, shared_secret_hash};

// ═══════════════════════════════════════════════════════════════════════════════
// CIPHER
// ═══════════════════════════════════════════════════════════════════════════════

/// AES-256-GCM cipher keyed by ECDH against the viewing key.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataCipher;

impl MetadataCipher {
    pub fn new() -> Self {
        Self
    }

    /// Encrypts a message for the holder of `viewing_pk`.
    ///
    /// A fresh ephemeral keypair and a random 96-bit nonce are drawn per
    /// call; the ephemeral private key never leaves this function.
    pub fn encrypt(&self, message: &[u8], viewing_pk: &CompressedPublicKey) -> Result<EncryptedMetadata> {
        let viewing_pk = parse_public_key(viewing_pk)?;
        let ephemeral_sk = SecretKey::random(&mut OsRng);
        let key_bytes = shared_secret_hash(&ephemeral_sk, &viewing_pk);

        let mut nonce = [0u8; GCM_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        let encrypted_data = cipher
            .encrypt(Nonce::from_slice(&nonce), message)
            .map_err(|_| VeilpayError::EncryptionFailed("AES-GCM seal failed".into()))?;

        Ok(EncryptedMetadata {
            encrypted_data,
            ephemeral_public_key: compress_public_key(&ephemeral_sk.public_key()),
            nonce: nonce.to_vec(),
        })
    }

    /// Decrypts metadata with the viewing private key.
    ///
    /// # Errors
    /// Returns `DecryptionFailed` on a wrong key, a truncated nonce, or a
    /// tampered ciphertext. Never returns an empty plaintext as a failure
    /// signal.
    pub fn decrypt(
        &self,
        encrypted: &EncryptedMetadata,
        viewing_sk: &StealthPrivateKey,
    ) -> Result<Vec<u8>> {
        if encrypted.nonce.len() != GCM_NONCE_SIZE {
            return Err(VeilpayError::DecryptionFailed(format!(
                "nonce must be {} bytes, got {}",
                GCM_NONCE_SIZE,
                encrypted.nonce.len()
            )));
        }

        let viewing_sk = parse_secret_key(viewing_sk)?;
        let ephemeral_pk = parse_public_key(&encrypted.ephemeral_public_key)?;
        let key_bytes = shared_secret_hash(&viewing_sk, &ephemeral_pk);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        cipher
            .decrypt(
                Nonce::from_slice(&encrypted.nonce),
                encrypted.encrypted_data.as_slice(),
            )
            .map_err(|_| {
                VeilpayError::DecryptionFailed("authentication failed (wrong key or tampered data)".into())
            })
    }

    /// Encrypts a memo as JSON.
    pub fn encrypt_memo(
        &self,
        memo: &TransactionMemo,
        viewing_pk: &CompressedPublicKey,
    ) -> Result<EncryptedMetadata> {
        let json = serde_json::to_vec(memo)?;
        self.encrypt(&json, viewing_pk)
    }

    /// Decrypts and parses a JSON memo.
    ///
    /// # Errors
    /// A plaintext that is not valid memo JSON maps to `DecryptionFailed`;
    /// it means the wrong key produced a forged-looking payload or the data
    /// was never a memo.
    pub fn decrypt_memo(
        &self,
        encrypted: &EncryptedMetadata,
        viewing_sk: &StealthPrivateKey,
    ) -> Result<TransactionMemo> {
        let plaintext = self.decrypt(encrypted, viewing_sk)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| VeilpayError::DecryptionFailed(format!("invalid memo payload: {}", e)))
    }
}
