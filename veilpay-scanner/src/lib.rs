//! # Veilpay Scanner
//!
//! Chain scanning for stealth payments.
//!
//! [`StealthPaymentScanner`] walks announcement events in bounded batches,
//! filters them with view tags, verifies candidates cryptographically, and
//! surfaces funded stealth addresses as payments. [`BackgroundScanner`]
//! runs that loop on a schedule, recording detections in payment history
//! and fanning out to webhooks and callbacks.
//!
//! [`MemoryRpc`] provides an in-process chain for tests and development.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

mod background;
mod rpc;
mod scanner;

pub use background::{BackgroundScanner, ErrorCallback, PaymentCallback};
pub use rpc::MemoryRpc;
pub use scanner::{ScanResult, StealthPaymentScanner};
