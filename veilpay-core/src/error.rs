//! Error types for Veilpay.
//!
//! This module provides a comprehensive error hierarchy using `thiserror`.
//! All errors include context and are designed to be actionable.

use thiserror::Error;

/// Result type alias using `VeilpayError`.
pub type Result<T> = std::result::Result<T, VeilpayError>;

/// Main error type for all Veilpay operations.
#[derive(Debug, Error)]
pub enum VeilpayError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CRYPTOGRAPHIC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Private key is malformed or out of the curve order.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Public key bytes do not decode to a point on secp256k1.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid key size or format.
    #[error("Invalid key: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    /// Failed to derive stealth keys.
    #[error("Stealth key derivation failed: {0}")]
    StealthDerivationError(String),

    /// Metadata encryption failed.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Metadata decryption failed (wrong key or corrupted ciphertext).
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STEALTH ADDRESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid meta-address format or content.
    #[error("Invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    /// Invalid stealth address format.
    #[error("Invalid stealth address: {0}")]
    InvalidStealthAddress(String),

    /// Invalid announcement content (malformed event data).
    #[error("Invalid announcement: {0}")]
    InvalidAnnouncement(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // POOL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Referenced team member is not registered.
    #[error("Team member not found: {0}")]
    MemberNotFound(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Chain RPC call failed.
    #[error("RPC call failed: {0}")]
    RpcError(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Connection timeout.
    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error (fatal: required key material or settings missing).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl VeilpayError {
    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VeilpayError::RpcError(_)
                | VeilpayError::HttpError(_)
                | VeilpayError::ConnectionTimeout(_)
        )
    }

    /// Returns true if this is a cryptographic error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            VeilpayError::InvalidPrivateKey(_)
                | VeilpayError::InvalidPublicKey(_)
                | VeilpayError::InvalidKeySize { .. }
                | VeilpayError::StealthDerivationError(_)
                | VeilpayError::EncryptionFailed(_)
                | VeilpayError::DecryptionFailed(_)
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            VeilpayError::ValidationError(_)
                | VeilpayError::InvalidMetaAddress(_)
                | VeilpayError::InvalidStealthAddress(_)
                | VeilpayError::InvalidAnnouncement(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VeilpayError::InvalidKeySize {
            expected: 33,
            actual: 20,
        };
        assert!(err.to_string().contains("33"));
        assert!(err.to_string().contains("20"));
    }

    #[test]
    fn test_error_classification() {
        assert!(VeilpayError::RpcError("test".into()).is_recoverable());
        assert!(VeilpayError::ConnectionTimeout("test".into()).is_recoverable());
        assert!(!VeilpayError::ConfigError("test".into()).is_recoverable());

        assert!(VeilpayError::InvalidPrivateKey("test".into()).is_crypto_error());
        assert!(VeilpayError::DecryptionFailed("test".into()).is_crypto_error());
        assert!(!VeilpayError::HttpError("test".into()).is_crypto_error());

        assert!(VeilpayError::InvalidMetaAddress("test".into()).is_validation_error());
        assert!(!VeilpayError::RpcError("test".into()).is_validation_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(VeilpayError::from);
        assert!(matches!(result, Err(VeilpayError::JsonError(_))));
    }
}
