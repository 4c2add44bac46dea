//! External interface traits.
//!
//! The engine talks to a chain only through [`ChainRpc`]. Production wires
//! this to a JSON-RPC provider; tests and local development use the
//! in-memory implementation in `veilpay-scanner`.

use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::error::Result;
use crate::types::{AnnouncementFilter, AnnouncementLog};

/// Read-only chain access required by the scanner.
///
/// Implementations own their transport concerns: every method must be
/// bounded in time (timeouts, retries) so callers can treat an `Err` as
/// transient and retry the batch.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Current chain head block number.
    async fn block_number(&self) -> Result<u64>;

    /// Native-asset balance of an address.
    async fn balance(&self, address: Address) -> Result<U256>;

    /// Announcement events matching the filter, in block order.
    async fn announcements(&self, filter: &AnnouncementFilter) -> Result<Vec<AnnouncementLog>>;
}
