//! Payment history storage and queries.

use std::collections::{HashMap, HashSet};

use ethers::types::{Address, U256};
use parking_lot::RwLock;
use tracing::debug;

use veilpay_core::types::{PaymentFilter, PaymentHistoryEntry, PaymentStats, PaymentStatus};

// ═══════════════════════════════════════════════════════════════════════════════
// MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Indexes guarded together by one lock so they can never disagree.
#[derive(Debug, Default)]
struct HistoryInner {
    /// Primary storage: payment id → entry
    payments: HashMap<String, PaymentHistoryEntry>,
    /// Stealth address → payment id
    stealth_index: HashMap<Address, String>,
    /// Wallet address → set of its stealth addresses
    wallet_index: HashMap<Address, HashSet<Address>>,
}

/// Thread-safe in-memory payment history.
///
/// # Identity
///
/// Entries are keyed by `"{tx_hash}-{stealth_address}"` in lowercase hex,
/// so rescanning the same chain range overwrites rather than duplicates.
/// Address keys are raw 20-byte values; differently-cased hex inputs of the
/// same address land on the same key.
///
/// # Thread Safety
///
/// All operations take `&self` and can be called concurrently.
#[derive(Debug, Default)]
pub struct PaymentHistoryManager {
    inner: RwLock<HistoryInner>,
}

impl PaymentHistoryManager {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a payment. Idempotent: an entry with an existing id replaces
    /// the previous one and re-points the indexes.
    pub fn add_payment(&self, entry: PaymentHistoryEntry) {
        let mut inner = self.inner.write();

        debug!(
            id = %entry.id,
            block = entry.block_number,
            "recording payment"
        );

        inner
            .stealth_index
            .insert(entry.stealth_address, entry.id.clone());
        inner
            .wallet_index
            .entry(entry.user_wallet_address)
            .or_default()
            .insert(entry.stealth_address);
        inner.payments.insert(entry.id.clone(), entry);
    }

    /// Updates the status of a payment. Returns false when the id is
    /// unknown.
    pub fn update_payment_status(&self, id: &str, status: PaymentStatus) -> bool {
        let mut inner = self.inner.write();
        match inner.payments.get_mut(id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    /// Looks up a payment by id.
    pub fn get_payment(&self, id: &str) -> Option<PaymentHistoryEntry> {
        self.inner.read().payments.get(id).cloned()
    }

    /// Looks up the payment recorded for a stealth address.
    pub fn get_payment_by_stealth_address(&self, address: Address) -> Option<PaymentHistoryEntry> {
        let inner = self.inner.read();
        let id = inner.stealth_index.get(&address)?;
        inner.payments.get(id).cloned()
    }

    /// Returns a wallet's payments, newest first, optionally filtered.
    pub fn get_payments_for_wallet(
        &self,
        wallet: Address,
        filter: Option<&PaymentFilter>,
    ) -> Vec<PaymentHistoryEntry> {
        let inner = self.inner.read();
        let mut payments: Vec<PaymentHistoryEntry> = inner
            .payments
            .values()
            .filter(|entry| entry.user_wallet_address == wallet)
            .filter(|entry| filter.map_or(true, |f| f.matches(entry)))
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        payments
    }

    /// Returns the stealth addresses known for a wallet.
    pub fn get_stealth_addresses_for_wallet(&self, wallet: Address) -> Vec<Address> {
        self.inner
            .read()
            .wallet_index
            .get(&wallet)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the wallet that owns a stealth address, if recorded.
    pub fn get_wallet_for_stealth_address(&self, address: Address) -> Option<Address> {
        let inner = self.inner.read();
        let id = inner.stealth_index.get(&address)?;
        inner.payments.get(id).map(|e| e.user_wallet_address)
    }

    /// Aggregates totals and per-status counts for a wallet.
    pub fn get_payment_stats(&self, wallet: Address) -> PaymentStats {
        let inner = self.inner.read();
        let mut stats = PaymentStats {
            total_payments: 0,
            total_amount: U256::zero(),
            pending_count: 0,
            claimed_count: 0,
            failed_count: 0,
        };

        for entry in inner
            .payments
            .values()
            .filter(|e| e.user_wallet_address == wallet)
        {
            stats.total_payments += 1;
            stats.total_amount = stats.total_amount.saturating_add(entry.amount);
            match entry.status {
                PaymentStatus::Pending => stats.pending_count += 1,
                PaymentStatus::Claimed => stats.claimed_count += 1,
                PaymentStatus::Failed => stats.failed_count += 1,
            }
        }

        stats
    }

    /// Number of recorded payments.
    pub fn len(&self) -> usize {
        self.inner.read().payments.len()
    }

    /// Returns true when no payments are recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.read().payments.is_empty()
    }

    /// Removes all payments and indexes.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.payments.clear();
        inner.stealth_index.clear();
        inner.wallet_index.clear();
    }

    /// Exports every entry, for backup or persistence.
    pub fn export_history(&self) -> Vec<PaymentHistoryEntry> {
        self.inner.read().payments.values().cloned().collect()
    }

    /// Imports entries, rebuilding the indexes. Existing ids are replaced.
    pub fn import_history(&self, entries: Vec<PaymentHistoryEntry>) -> usize {
        let count = entries.len();
        for entry in entries {
            self.add_payment(entry);
        }
        debug!(count, "imported payment history");
        count
    }
}
