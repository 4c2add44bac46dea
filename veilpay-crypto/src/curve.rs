//! secp256k1 curve operations.
//!
//! ## Derivation flow
//!
//! ```text
//! S = priv · pub                      (ECDH, symmetric)
//!       ↓
//! h = keccak256(x-coordinate of S)    (shared-secret digest)
//!       ↓
//! view_tag = h[0]
//! t = h mod n                          (tweak scalar)
//!       ↓
//! stealth_pub  = spending_pub + t·G
//! stealth_addr = keccak256(uncompressed(stealth_pub)[1..])[12..]
//! stealth_sk   = spending_sk + t mod n
//! ```
//!
//! Every consumer of the shared secret (address generation, verification,
//! scanning, metadata encryption) goes through [`shared_secret_hash`]; the
//! digest grants no capability beyond payment detection.

use ethers::types::Address;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::Group;
use k256::{ProjectivePoint, PublicKey, Scalar, SecretKey};

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::{CompressedPublicKey, StealthPrivateKey};

use crate::hash::{eth_address_from_pubkey_body, keccak256};

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses a private key into a curve secret key.
///
/// # Errors
/// Returns `InvalidPrivateKey` when the scalar is zero or not below the
/// curve order.
pub(crate) fn parse_secret_key(key: &StealthPrivateKey) -> Result<SecretKey> {
    SecretKey::from_slice(key.as_bytes())
        .map_err(|_| VeilpayError::InvalidPrivateKey("scalar out of range".into()))
}

/// Parses a compressed public key into a curve point.
///
/// # Errors
/// Returns `InvalidPublicKey` when the encoding is not a point on secp256k1.
pub(crate) fn parse_public_key(key: &CompressedPublicKey) -> Result<PublicKey> {
    PublicKey::from_sec1_bytes(key.as_bytes())
        .map_err(|_| VeilpayError::InvalidPublicKey("not a point on secp256k1".into()))
}

/// Checks that a compressed key decodes to a point on secp256k1.
///
/// # Errors
/// Returns `InvalidPublicKey` otherwise.
pub fn validate_public_key(key: &CompressedPublicKey) -> Result<()> {
    parse_public_key(key).map(|_| ())
}

/// SEC1-compresses a curve point back into the wire representation.
pub(crate) fn compress_public_key(key: &PublicKey) -> CompressedPublicKey {
    let encoded = key.to_encoded_point(true);
    let mut bytes = [0u8; 33];
    bytes.copy_from_slice(encoded.as_bytes());
    CompressedPublicKey::from_array(bytes)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED SECRET
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes the shared-secret digest `keccak256(x-coordinate of priv · pub)`.
///
/// ECDH is symmetric, so `(eph_sk, viewing_pk)` on the sender side and
/// `(viewing_sk, eph_pk)` on the recipient side produce the same digest.
pub(crate) fn shared_secret_hash(secret: &SecretKey, public: &PublicKey) -> [u8; 32] {
    let scalar: Scalar = *secret.to_nonzero_scalar().as_ref();
    let shared = public.to_projective() * scalar;
    let encoded = shared.to_affine().to_encoded_point(true);
    // Hash the x-coordinate only (compressed encoding minus the parity byte)
    keccak256(&encoded.as_bytes()[1..])
}

/// Reduces the shared-secret digest to a tweak scalar mod the curve order.
pub(crate) fn tweak_scalar(hash: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<k256::U256>>::reduce_bytes(&(*hash).into())
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH POINT & ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes `spending_pub + t·G`.
///
/// # Errors
/// Returns `StealthDerivationError` in the negligible case where the sum is
/// the point at infinity.
pub(crate) fn stealth_point(spending_pk: &PublicKey, tweak: &Scalar) -> Result<ProjectivePoint> {
    let point = spending_pk.to_projective() + ProjectivePoint::GENERATOR * tweak;
    if bool::from(point.is_identity()) {
        return Err(VeilpayError::StealthDerivationError(
            "derived point is the identity".into(),
        ));
    }
    Ok(point)
}

/// Derives the Ethereum address of a curve point.
pub(crate) fn point_to_eth_address(point: &ProjectivePoint) -> Address {
    let encoded = point.to_affine().to_encoded_point(false);
    let mut body = [0u8; 64];
    body.copy_from_slice(&encoded.as_bytes()[1..]);
    Address::from(eth_address_from_pubkey_body(&body))
}
