//! # Veilpay History
//!
//! In-memory payment history for detected stealth payments.
//!
//! Payments are keyed by a deterministic `(transaction, stealth address)`
//! id, making recording idempotent across rescans. Two secondary indexes
//! answer the common reverse lookups: stealth address to owning wallet, and
//! wallet to its set of stealth addresses.
//!
//! Persistence lives outside this crate; `export_history` and
//! `import_history` are the hook points.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

mod manager;

pub use manager::PaymentHistoryManager;
