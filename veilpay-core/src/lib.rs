//! # Veilpay Core
//!
//! Core types, errors, and traits for the Veilpay stealth payment engine.
//!
//! This crate provides the foundational building blocks used by all other Veilpay crates:
//!
//! - **Types**: Domain models for keys, meta-addresses, announcements, payments and teams
//! - **Errors**: Comprehensive error types with context
//! - **Constants**: Protocol constants and sizes
//! - **Traits**: The `ChainRpc` boundary to the chain
//!
//! ## Example
//!
//! ```rust
//! use veilpay_core::{CompressedPublicKey, MetaAddress};
//!
//! let mut spend = [0x11u8; 33];
//! spend[0] = 0x02;
//! let mut view = [0x22u8; 33];
//! view[0] = 0x03;
//!
//! let meta = MetaAddress::new(
//!     CompressedPublicKey::from_array(spend),
//!     CompressedPublicKey::from_array(view),
//! );
//! let encoded = meta.encode();
//! assert_eq!(MetaAddress::decode(&encoded).unwrap(), meta);
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use config::ScanningConfig;
pub use constants::*;
pub use error::{Result, VeilpayError};
pub use traits::ChainRpc;
pub use types::*;
