//! View tag computation for efficient scanning.
//!
//! View tags let recipients filter announcements cheaply:
//! - Each announcement carries a 1-byte view tag in its metadata
//! - Recipients compute their expected tag from the shared secret
//! - Only matching announcements require a full address derivation
//!
//! With a 1-byte tag (256 values), about 255/256 of foreign announcements
//! are skipped after a single ECDH and hash. A match is only a candidate;
//! roughly 1 in 256 unrelated announcements collides, so the full check in
//! `StealthAddressGenerator::verify` stays authoritative. A mismatch is
//! definitive: the tag never produces false negatives.

use veilpay_core::error::Result;
use veilpay_core::types::{CompressedPublicKey, StealthPrivateKey};

use crate::curve::{parse_public_key, parse_secret_key, shared_secret_hash};

/// Extracts the view tag from a shared-secret digest.
pub fn view_tag_from_hash(hash: &[u8; 32]) -> u8 {
    hash[0]
}

/// Computes the view tag a recipient expects for a given ephemeral key.
///
/// # Errors
/// Returns an error when either key fails curve validation.
pub fn compute_view_tag(
    viewing_sk: &StealthPrivateKey,
    ephemeral_pk: &CompressedPublicKey,
) -> Result<u8> {
    let sk = parse_secret_key(viewing_sk)?;
    let pk = parse_public_key(ephemeral_pk)?;
    Ok(view_tag_from_hash(&shared_secret_hash(&sk, &pk)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::SecretKey;

    use crate::curve::compress_public_key;

    #[test]
    fn test_view_tag_is_first_hash_byte() {
        let mut hash = [0u8; 32];
        hash[0] = 0xE1;
        assert_eq!(view_tag_from_hash(&hash), 0xE1);
    }

    #[test]
    fn test_sender_and_recipient_agree() {
        let viewing = SecretKey::from_slice(&[0x05; 32]).unwrap();
        let ephemeral = SecretKey::from_slice(&[0x09; 32]).unwrap();

        // Sender side: eph_sk with viewing_pk
        let sender_hash = crate::curve::shared_secret_hash(&ephemeral, &viewing.public_key());

        // Recipient side: viewing_sk with eph_pk
        let viewing_sk = StealthPrivateKey::from_array([0x05; 32]);
        let eph_pk = compress_public_key(&ephemeral.public_key());
        let recipient_tag = compute_view_tag(&viewing_sk, &eph_pk).unwrap();

        assert_eq!(recipient_tag, view_tag_from_hash(&sender_hash));
    }
}
