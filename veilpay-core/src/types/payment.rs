//! Payment types: stealth address generation results, detected payments and
//! history entries.

use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::types::keys::CompressedPublicKey;
use crate::types::metadata::TransactionMemo;

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything a sender needs after generating a stealth address: the address
/// to pay, the ephemeral key to announce, and the view tag for metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthAddressResult {
    /// The derived one-time Ethereum address.
    pub stealth_address: Address,
    /// Ephemeral public key; published so the recipient can re-derive the
    /// shared secret.
    pub ephemeral_pub_key: CompressedPublicKey,
    /// First byte of the shared-secret hash.
    pub view_tag: u8,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DETECTED PAYMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A payment detected by the scanner: an announcement that verified against
/// our viewing key, enriched with on-chain balance data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPayment {
    pub stealth_address: Address,
    pub ephemeral_pub_key: CompressedPublicKey,
    pub view_tag: u8,
    pub block_number: u64,
    pub transaction_hash: H256,
    /// Balance found at the stealth address, if queried.
    pub amount: Option<U256>,
    /// Token contract, `None` for the native asset.
    pub token_address: Option<Address>,
    /// Raw announcement metadata past the view tag, if any.
    pub metadata: Option<Vec<u8>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// HISTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifecycle state of a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Claimed,
    Failed,
}

/// A payment as recorded by the history manager, tied to the wallet that
/// owns the receiving identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHistoryEntry {
    /// Deterministic id: `"{tx_hash}-{stealth_address}"` in lowercase hex.
    /// Rescans of the same event map to the same id.
    pub id: String,
    pub stealth_address: Address,
    pub user_wallet_address: Address,
    pub ephemeral_pub_key: CompressedPublicKey,
    pub view_tag: u8,
    pub amount: U256,
    pub token_address: Option<Address>,
    pub transaction_hash: H256,
    pub block_number: u64,
    /// Unix milliseconds when the payment was recorded.
    pub timestamp: u64,
    pub status: PaymentStatus,
    pub metadata: Option<Vec<u8>>,
    /// Memo recovered from encrypted metadata, when decryption succeeded.
    pub decrypted_memo: Option<TransactionMemo>,
}

impl PaymentHistoryEntry {
    /// Builds the deterministic entry id for a (transaction, stealth address)
    /// pair. Lowercase so differently-cased inputs collapse to one entry.
    pub fn make_id(transaction_hash: H256, stealth_address: Address) -> String {
        format!(
            "0x{}-0x{}",
            hex::encode(transaction_hash.as_bytes()),
            hex::encode(stealth_address.as_bytes())
        )
    }
}

/// Conjunctive filters for wallet payment queries.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
    /// Inclusive unix-ms lower bound on `timestamp`.
    pub from_timestamp: Option<u64>,
    /// Inclusive unix-ms upper bound on `timestamp`.
    pub to_timestamp: Option<u64>,
    pub min_amount: Option<U256>,
    pub max_amount: Option<U256>,
}

impl PaymentFilter {
    /// Returns true if the entry passes every set filter.
    pub fn matches(&self, entry: &PaymentHistoryEntry) -> bool {
        if let Some(status) = self.status {
            if entry.status != status {
                return false;
            }
        }
        if let Some(from) = self.from_timestamp {
            if entry.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to_timestamp {
            if entry.timestamp > to {
                return false;
            }
        }
        if let Some(min) = self.min_amount {
            if entry.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if entry.amount > max {
                return false;
            }
        }
        true
    }
}

/// Aggregate statistics over a wallet's payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStats {
    pub total_payments: usize,
    pub total_amount: U256,
    pub pending_count: usize,
    pub claimed_count: usize,
    pub failed_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COMPRESSED_PUBLIC_KEY_SIZE;

    fn entry(amount: u64, timestamp: u64, status: PaymentStatus) -> PaymentHistoryEntry {
        let tx = H256::repeat_byte(0x11);
        let addr = Address::repeat_byte(0x22);
        let mut pk = [0x33; COMPRESSED_PUBLIC_KEY_SIZE];
        pk[0] = 0x02;
        PaymentHistoryEntry {
            id: PaymentHistoryEntry::make_id(tx, addr),
            stealth_address: addr,
            user_wallet_address: Address::repeat_byte(0x44),
            ephemeral_pub_key: CompressedPublicKey::from_array(pk),
            view_tag: 0xE1,
            amount: U256::from(amount),
            token_address: None,
            transaction_hash: tx,
            block_number: 100,
            timestamp,
            status,
            metadata: None,
            decrypted_memo: None,
        }
    }

    #[test]
    fn test_make_id_is_lowercase_and_deterministic() {
        let tx = H256::repeat_byte(0xAB);
        let addr = Address::repeat_byte(0xCD);
        let id = PaymentHistoryEntry::make_id(tx, addr);
        assert_eq!(id, id.to_lowercase());
        assert_eq!(id, PaymentHistoryEntry::make_id(tx, addr));
        assert!(id.contains('-'));
    }

    #[test]
    fn test_filter_default_matches_everything() {
        let filter = PaymentFilter::default();
        assert!(filter.matches(&entry(100, 1000, PaymentStatus::Pending)));
    }

    #[test]
    fn test_filter_status() {
        let filter = PaymentFilter {
            status: Some(PaymentStatus::Claimed),
            ..Default::default()
        };
        assert!(!filter.matches(&entry(100, 1000, PaymentStatus::Pending)));
        assert!(filter.matches(&entry(100, 1000, PaymentStatus::Claimed)));
    }

    #[test]
    fn test_filter_time_range_inclusive() {
        let filter = PaymentFilter {
            from_timestamp: Some(1000),
            to_timestamp: Some(2000),
            ..Default::default()
        };
        assert!(filter.matches(&entry(1, 1000, PaymentStatus::Pending)));
        assert!(filter.matches(&entry(1, 2000, PaymentStatus::Pending)));
        assert!(!filter.matches(&entry(1, 999, PaymentStatus::Pending)));
        assert!(!filter.matches(&entry(1, 2001, PaymentStatus::Pending)));
    }

    #[test]
    fn test_filter_amount_range() {
        let filter = PaymentFilter {
            min_amount: Some(U256::from(50)),
            max_amount: Some(U256::from(150)),
            ..Default::default()
        };
        assert!(filter.matches(&entry(50, 0, PaymentStatus::Pending)));
        assert!(filter.matches(&entry(150, 0, PaymentStatus::Pending)));
        assert!(!filter.matches(&entry(49, 0, PaymentStatus::Pending)));
        assert!(!filter.matches(&entry(151, 0, PaymentStatus::Pending)));
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&PaymentStatus::Claimed).unwrap();
        assert_eq!(json, "\"claimed\"");
    }
}
