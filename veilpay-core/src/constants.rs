//! Protocol constants for Veilpay.
//!
//! Cryptographic sizes follow the chain's native secp256k1 account scheme
//! and the ERC-5564 announcement layout.

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a secp256k1 private key (scalar) in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a SEC1 compressed secp256k1 public key in bytes (parity byte + x).
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Size of a SEC1 uncompressed secp256k1 public key in bytes (0x04 + x + y).
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;

/// Size of the keccak-256 digest of an ECDH shared secret.
pub const SHARED_SECRET_HASH_SIZE: usize = 32;

/// Size of the AES-256-GCM nonce used for metadata encryption.
pub const GCM_NONCE_SIZE: usize = 12;

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW TAG CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of view tag in bytes.
/// Using 1 byte gives 99.6% filtering efficiency (1/256 false positive rate).
pub const VIEW_TAG_SIZE: usize = 1;

/// Number of possible view tag values (2^8 = 256).
pub const VIEW_TAG_SPACE: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of an Ethereum address in bytes (20 bytes = 160 bits).
pub const ETH_ADDRESS_SIZE: usize = 20;

/// ERC-5564 scheme id for the secp256k1-with-view-tags scheme.
pub const SCHEME_ID_SECP256K1: u64 = 1;

/// Solidity signature of the ERC-5564 announcement event.
pub const ANNOUNCEMENT_EVENT_SIGNATURE: &str =
    "Announcement(uint256,address,address,bytes,bytes)";

/// Prefix of the compact meta-address string encoding (`st:eth:0x…`).
pub const META_ADDRESS_PREFIX: &str = "st:eth:0x";

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default number of blocks scanned per `scan_blocks` call.
pub const DEFAULT_SCAN_BATCH_SIZE: u64 = 1000;

/// Default capacity of the scanner's bounded view-tag verdict cache.
pub const DEFAULT_VIEW_TAG_CACHE_SIZE: usize = 4096;

/// Default interval between background scans, in milliseconds.
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 60_000;

// ═══════════════════════════════════════════════════════════════════════════════
// POOL DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default number of stealth addresses pre-generated per team member.
pub const DEFAULT_PRE_GENERATE_COUNT: usize = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// WEBHOOK DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default webhook delivery timeout, in milliseconds.
pub const DEFAULT_WEBHOOK_TIMEOUT_MS: u64 = 5000;

/// Default number of redelivery attempts after a failed webhook.
pub const DEFAULT_WEBHOOK_RETRIES: u32 = 3;

/// Header carrying the HMAC-SHA256 signature of the webhook body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Veilpay-Signature";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_sizes_match_sec1() {
        assert_eq!(COMPRESSED_PUBLIC_KEY_SIZE, 1 + 32);
        assert_eq!(UNCOMPRESSED_PUBLIC_KEY_SIZE, 1 + 32 + 32);
        assert_eq!(PRIVATE_KEY_SIZE, 32);
    }

    #[test]
    fn test_view_tag_space() {
        assert_eq!(VIEW_TAG_SPACE, 1 << (8 * VIEW_TAG_SIZE));
    }

    #[test]
    fn test_announcement_signature_shape() {
        assert!(ANNOUNCEMENT_EVENT_SIGNATURE.starts_with("Announcement("));
        assert_eq!(ANNOUNCEMENT_EVENT_SIGNATURE.matches(',').count(), 4);
    }
}
