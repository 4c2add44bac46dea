//! ERC-5564 announcement event types.

use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOUNCEMENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// A decoded `Announcement(uint256,address,address,bytes,bytes)` event.
///
/// Emitted by the announcer contract for every stealth payment. The first
/// byte of `metadata` is the view tag used for fast scan filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementLog {
    /// Stealth address scheme identifier (1 = secp256k1 with view tags).
    pub scheme_id: U256,
    /// The one-time stealth address that received funds.
    pub stealth_address: Address,
    /// The account that called the announcer contract.
    pub caller: Address,
    /// SEC1-compressed ephemeral public key published by the sender.
    pub ephemeral_pub_key: Vec<u8>,
    /// Arbitrary metadata; byte 0 is the view tag.
    pub metadata: Vec<u8>,
    /// Block this announcement was mined in.
    pub block_number: u64,
    /// Hash of the announcing transaction.
    pub transaction_hash: H256,
}

impl AnnouncementLog {
    /// Returns the view tag (first metadata byte), if any metadata exists.
    pub fn view_tag(&self) -> Option<u8> {
        self.metadata.first().copied()
    }
}

/// Filter passed to `ChainRpc::announcements`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementFilter {
    /// First block to include (inclusive).
    pub from_block: u64,
    /// Last block to include (inclusive).
    pub to_block: u64,
    /// Restrict to events from this announcer contract, if set.
    pub announcer: Option<Address>,
}

impl AnnouncementFilter {
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            announcer: None,
        }
    }

    pub fn with_announcer(mut self, announcer: Address) -> Self {
        self.announcer = Some(announcer);
        self
    }
}
