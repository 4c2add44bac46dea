//! # Veilpay Pool
//!
//! Team member registry with per-member pools of pre-generated stealth
//! addresses.
//!
//! Members carry `Admin`/`Member`/`Viewer` roles; the registry refuses to
//! remove or demote the last admin. Pools refill on demand when exhausted,
//! and `export_pool`/`import_pool` are the persistence hook points.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

mod pool;

pub use pool::{PoolExport, TeamStealthAddressPool};
