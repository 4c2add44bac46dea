//! # Veilpay Cryptography
//!
//! secp256k1 stealth address primitives for the Veilpay engine.
//!
//! This crate provides:
//!
//! - **Stealth**: ERC-5564-style address generation, verification, key recovery
//! - **Curve**: shared-secret ECDH digest and tweak-scalar arithmetic
//! - **View Tags**: 1-byte announcement filtering for scanning
//! - **Cipher**: AES-256-GCM metadata and memo encryption (ECIES)
//!
//! ## Security Properties
//!
//! - Stealth address comparison in `verify` is constant-time
//! - Private key material is zeroized on drop (`StealthPrivateKey`)
//! - Metadata encryption is authenticated; wrong keys fail closed
//!
//! ## Example
//!
//! ```rust,ignore
//! use veilpay_crypto::StealthAddressGenerator;
//!
//! let generator = StealthAddressGenerator::new();
//!
//! // Sender: one-time address + announcement material
//! let result = generator.generate(&recipient_meta)?;
//!
//! // Recipient: detect with the viewing key only
//! let ours = generator.verify(
//!     result.stealth_address,
//!     &result.ephemeral_pub_key,
//!     &viewing_sk,
//!     &recipient_meta.spending_pk,
//! )?;
//!
//! // Recipient: recover the spending key for this address
//! let stealth_sk = generator.derive_stealth_private_key(
//!     &result.ephemeral_pub_key,
//!     &viewing_sk,
//!     &spending_sk,
//! )?;
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod cipher;
pub mod curve;
pub mod hash;
pub mod stealth;
pub mod view_tag;

// Re-export main types at crate root
pub use cipher::MetadataCipher;
pub use curve::validate_public_key;
pub use hash::keccak256;
pub use stealth::StealthAddressGenerator;
pub use view_tag::{compute_view_tag, view_tag_from_hash};
