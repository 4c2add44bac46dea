//! Keccak-256 hashing utilities.
//!
//! Everything address-shaped in the protocol runs through Keccak-256: the
//! shared-secret digest, the stealth address itself, and the view tag that
//! falls out of the digest's first byte.

use sha3::{Digest, Keccak256};

use veilpay_core::constants::ETH_ADDRESS_SIZE;

// ═══════════════════════════════════════════════════════════════════════════════
// KECCAK-256
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes the Keccak-256 hash of the input.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Derives an Ethereum address from an uncompressed public key body
/// (the 64 bytes after the 0x04 prefix).
///
/// The address is the last 20 bytes of `keccak256(x || y)`.
pub fn eth_address_from_pubkey_body(body: &[u8; 64]) -> [u8; ETH_ADDRESS_SIZE] {
    let hash = keccak256(body);
    let mut address = [0u8; ETH_ADDRESS_SIZE];
    address.copy_from_slice(&hash[32 - ETH_ADDRESS_SIZE..]);
    address
}
