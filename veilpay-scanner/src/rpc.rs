//! In-memory `ChainRpc` implementation.
//!
//! Fast, deterministic chain stand-in for development, testing, and
//! single-process deployments. Announcements and balances are seeded
//! directly; no network involved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ethers::types::{Address, U256};
use parking_lot::RwLock;

use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::traits::ChainRpc;
use veilpay_core::types::{AnnouncementFilter, AnnouncementLog};

#[derive(Debug, Default)]
struct MemoryRpcInner {
    block_number: u64,
    balances: HashMap<Address, U256>,
    announcements: Vec<AnnouncementLog>,
}

/// In-memory chain state behind the `ChainRpc` trait.
///
/// # Thread Safety
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug, Default)]
pub struct MemoryRpc {
    inner: RwLock<MemoryRpcInner>,
    /// When set, every call fails with `RpcError`. Used to exercise
    /// transient-failure paths.
    fail: AtomicBool,
}

impl MemoryRpc {
    /// Creates an empty chain at block 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chain head.
    pub fn set_block_number(&self, block: u64) {
        self.inner.write().block_number = block;
    }

    /// Sets an address balance.
    pub fn set_balance(&self, address: Address, balance: U256) {
        self.inner.write().balances.insert(address, balance);
    }

    /// Appends an announcement event.
    pub fn push_announcement(&self, announcement: AnnouncementLog) {
        let mut inner = self.inner.write();
        inner.block_number = inner.block_number.max(announcement.block_number);
        inner.announcements.push(announcement);
    }

    /// Makes every subsequent call fail (or succeed again) with `RpcError`.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(VeilpayError::RpcError("simulated rpc failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainRpc for MemoryRpc {
    async fn block_number(&self) -> Result<u64> {
        self.check_failing()?;
        Ok(self.inner.read().block_number)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.check_failing()?;
        Ok(self
            .inner
            .read()
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn announcements(&self, filter: &AnnouncementFilter) -> Result<Vec<AnnouncementLog>> {
        self.check_failing()?;
        let inner = self.inner.read();
        Ok(inner
            .announcements
            .iter()
            .filter(|a| a.block_number >= filter.from_block && a.block_number <= filter.to_block)
            .filter(|a| filter.announcer.map_or(true, |caller| a.caller == caller))
            .cloned()
            .collect())
    }
}
