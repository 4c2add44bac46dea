//! Stealth address generation, verification and key recovery.
//!
//! Implements the ERC-5564 single-key flow on secp256k1:
//!
//! - The sender generates an ephemeral keypair, derives a one-time address
//!   from the recipient's meta-address, and announces the ephemeral public
//!   key plus a view tag.
//! - The recipient re-derives the same address from the announcement using
//!   only the viewing private key.
//! - Spending requires the spending private key, which never participates
//!   in detection.

use ethers::types::Address;
use k256::elliptic_curve::Field;
use k256::{PublicKey, Scalar, SecretKey};
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::{
    CompressedPublicKey, MetaAddress, StealthAddressResult, StealthPrivateKey,
};

use crate::curve::{
    compress_public_key, parse_public_key, parse_secret_key, point_to_eth_address,
    shared_secret_hash, stealth_point, tweak_scalar,
};
use crate::view_tag::view_tag_from_hash;

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateless stealth address engine.
///
/// All methods are pure functions over their inputs; the struct exists so
/// callers hold one value rather than importing free functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StealthAddressGenerator;

impl StealthAddressGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates a fresh stealth address for a recipient's meta-address.
    ///
    /// A new ephemeral keypair is drawn from the OS RNG per call; two calls
    /// with the same meta-address produce unlinkable addresses. The
    /// ephemeral private key never leaves this function.
    ///
    /// # Errors
    /// Returns `InvalidPublicKey` when either meta-address key fails curve
    /// validation.
    pub fn generate(&self, meta: &MetaAddress) -> Result<StealthAddressResult> {
        let ephemeral_sk = SecretKey::random(&mut OsRng);
        self.generate_inner(meta, &ephemeral_sk)
    }

    /// Deterministic variant of [`generate`](Self::generate) taking the
    /// ephemeral private key explicitly. Used for test vectors and audits.
    pub fn generate_with_ephemeral(
        &self,
        meta: &MetaAddress,
        ephemeral_sk: &StealthPrivateKey,
    ) -> Result<StealthAddressResult> {
        let ephemeral_sk = parse_secret_key(ephemeral_sk)?;
        self.generate_inner(meta, &ephemeral_sk)
    }

    fn generate_inner(
        &self,
        meta: &MetaAddress,
        ephemeral_sk: &SecretKey,
    ) -> Result<StealthAddressResult> {
        let spending_pk = parse_public_key(&meta.spending_pk)?;
        let viewing_pk = parse_public_key(&meta.viewing_pk)?;

        let hash = shared_secret_hash(ephemeral_sk, &viewing_pk);
        let (stealth_address, view_tag) = derive_address(&spending_pk, &hash)?;

        Ok(StealthAddressResult {
            stealth_address,
            ephemeral_pub_key: compress_public_key(&ephemeral_sk.public_key()),
            view_tag,
        })
    }

    /// Checks whether a stealth address belongs to the holder of
    /// `viewing_sk` for the given announcement.
    ///
    /// This is the authoritative check behind the view-tag fast path. The
    /// address comparison is constant-time.
    ///
    /// # Errors
    /// Returns an error when a key fails curve validation; a well-formed
    /// announcement that simply isn't ours yields `Ok(false)`.
    pub fn verify(
        &self,
        stealth_address: Address,
        ephemeral_pk: &CompressedPublicKey,
        viewing_sk: &StealthPrivateKey,
        spending_pk: &CompressedPublicKey,
    ) -> Result<bool> {
        let viewing_sk = parse_secret_key(viewing_sk)?;
        let ephemeral_pk = parse_public_key(ephemeral_pk)?;
        let spending_pk = parse_public_key(spending_pk)?;

        let hash = shared_secret_hash(&viewing_sk, &ephemeral_pk);
        let (expected, _) = derive_address(&spending_pk, &hash)?;

        Ok(expected
            .as_bytes()
            .ct_eq(stealth_address.as_bytes())
            .into())
    }

    /// Recovers the private key controlling a stealth address:
    /// `stealth_sk = spending_sk + t mod n`.
    ///
    /// # Errors
    /// Returns `StealthDerivationError` in the negligible case where the
    /// sum is zero, and key validation errors otherwise.
    pub fn derive_stealth_private_key(
        &self,
        ephemeral_pk: &CompressedPublicKey,
        viewing_sk: &StealthPrivateKey,
        spending_sk: &StealthPrivateKey,
    ) -> Result<StealthPrivateKey> {
        let viewing_sk = parse_secret_key(viewing_sk)?;
        let ephemeral_pk = parse_public_key(ephemeral_pk)?;
        let spending_sk = parse_secret_key(spending_sk)?;

        let hash = shared_secret_hash(&viewing_sk, &ephemeral_pk);
        let tweak = tweak_scalar(&hash);

        let spending_scalar: Scalar = *spending_sk.to_nonzero_scalar().as_ref();
        let stealth_scalar = spending_scalar + tweak;
        if bool::from(stealth_scalar.is_zero()) {
            return Err(VeilpayError::StealthDerivationError(
                "derived scalar is zero".into(),
            ));
        }

        let bytes: [u8; 32] = stealth_scalar.to_bytes().into();
        Ok(StealthPrivateKey::from_array(bytes))
    }
}

/// Shared tail of generation and verification: digest to (address, tag).
fn derive_address(spending_pk: &PublicKey, hash: &[u8; 32]) -> Result<(Address, u8)> {
    let tweak = tweak_scalar(hash);
    let point = stealth_point(spending_pk, &tweak)?;
    Ok((point_to_eth_address(&point), view_tag_from_hash(hash)))
}
