//! Batched, view-tag-filtered announcement scanning.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, warn};

use veilpay_core::config::ScanningConfig;
use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::traits::ChainRpc;
use veilpay_core::types::{
    AnnouncementFilter, AnnouncementLog, CompressedPublicKey, StealthPayment, StealthPrivateKey,
};
use veilpay_crypto::{compute_view_tag, StealthAddressGenerator};

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of one scan batch.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Payments that verified as ours and carry a balance.
    pub payments: Vec<StealthPayment>,
    /// First block of the batch.
    pub from_block: u64,
    /// Last block of the batch (inclusive).
    pub to_block: u64,
    /// Number of blocks covered; zero for an empty range.
    pub scanned_blocks: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Scans announcement events for payments to one stealth identity.
///
/// # Filtering pipeline
///
/// 1. View tag: one ECDH + hash per announcement, drops ~255/256 of
///    foreign traffic. Misses are remembered in a bounded LRU cache keyed
///    by `(view_tag, ephemeral key)`, so rescans skip even that work.
/// 2. Full verification: authoritative address derivation, immune to the
///    tag's 1-in-256 collisions.
/// 3. Balance: only funded addresses become payments.
///
/// # Cursor
///
/// `scan_new_payments` resumes where the previous batch ended. The cursor
/// only moves forward, and only after a batch completes; a failed batch is
/// retried from the same position.
pub struct StealthPaymentScanner {
    config: ScanningConfig,
    rpc: Arc<dyn ChainRpc>,
    generator: StealthAddressGenerator,
    /// Known view-tag misses. Entry present = announcement is not ours.
    miss_cache: Mutex<LruCache<(u8, Vec<u8>), ()>>,
    /// Start of the next unscanned range.
    next_block: AtomicU64,
}

impl std::fmt::Debug for StealthPaymentScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthPaymentScanner")
            .field("chain_id", &self.config.chain_id)
            .field("next_block", &self.next_block.load(Ordering::SeqCst))
            .finish()
    }
}

impl StealthPaymentScanner {
    /// Creates a scanner over the given chain access.
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid scanning parameters.
    pub fn new(config: ScanningConfig, rpc: Arc<dyn ChainRpc>) -> Result<Self> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.view_tag_cache_size).ok_or_else(|| {
            VeilpayError::ConfigError("view_tag_cache_size must be non-zero".into())
        })?;

        Ok(Self {
            next_block: AtomicU64::new(config.start_block),
            miss_cache: Mutex::new(LruCache::new(capacity)),
            generator: StealthAddressGenerator::new(),
            config,
            rpc,
        })
    }

    /// The scanning configuration this scanner was built with.
    pub fn config(&self) -> &ScanningConfig {
        &self.config
    }

    /// Scans a block range for payments to this identity.
    ///
    /// `from_block` defaults to the cursor, `to_block` to the chain head.
    /// The range is clamped to `batch_size` blocks and never past the head.
    /// An empty effective range returns an empty result and leaves the
    /// cursor alone; malformed individual announcements are logged and
    /// skipped without failing the batch.
    pub async fn scan_blocks(
        &self,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<ScanResult> {
        let from = from_block.unwrap_or_else(|| self.next_block.load(Ordering::SeqCst));
        let head = self.rpc.block_number().await?;
        let batch_end = from.saturating_add(self.config.batch_size - 1);
        let end = to_block.unwrap_or(u64::MAX).min(head).min(batch_end);

        if end < from {
            return Ok(ScanResult {
                payments: Vec::new(),
                from_block: from,
                to_block: from,
                scanned_blocks: 0,
            });
        }

        let mut filter = AnnouncementFilter::new(from, end);
        if let Some(announcer) = self.config.announcer {
            filter = filter.with_announcer(announcer);
        }
        let announcements = self.rpc.announcements(&filter).await?;

        debug!(
            from,
            to = end,
            count = announcements.len(),
            "scanning announcement batch"
        );

        let mut payments = Vec::new();
        for announcement in &announcements {
            match self.process_announcement(announcement).await {
                Ok(Some(payment)) => payments.push(payment),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        block = announcement.block_number,
                        error = %e,
                        "skipping malformed announcement"
                    );
                }
            }
        }

        // Advance only after the whole batch succeeded, and never backward
        self.next_block.fetch_max(end + 1, Ordering::SeqCst);

        Ok(ScanResult {
            payments,
            from_block: from,
            to_block: end,
            scanned_blocks: end - from + 1,
        })
    }

    /// Scans the next unseen batch from the cursor.
    pub async fn scan_new_payments(&self) -> Result<ScanResult> {
        self.scan_blocks(None, None).await
    }

    /// Recovers the private key for a detected payment.
    ///
    /// # Errors
    /// `ConfigError` when the scanner holds no spending private key.
    pub fn get_stealth_private_key(&self, payment: &StealthPayment) -> Result<StealthPrivateKey> {
        let spending_sk = self.config.spending_private_key.as_ref().ok_or_else(|| {
            VeilpayError::ConfigError("spending private key not configured".into())
        })?;
        self.generator.derive_stealth_private_key(
            &payment.ephemeral_pub_key,
            &self.config.viewing_private_key,
            spending_sk,
        )
    }

    /// Last block already covered by the cursor.
    pub fn last_scanned_block(&self) -> u64 {
        self.next_block.load(Ordering::SeqCst).saturating_sub(1)
    }

    /// Number of cached view-tag misses.
    pub fn cache_len(&self) -> usize {
        self.miss_cache.lock().len()
    }

    /// Drops all cached view-tag misses.
    pub fn clear_cache(&self) {
        self.miss_cache.lock().clear();
    }

    async fn process_announcement(
        &self,
        announcement: &AnnouncementLog,
    ) -> Result<Option<StealthPayment>> {
        let Some(view_tag) = announcement.view_tag() else {
            return Ok(None);
        };

        let cache_key = (view_tag, announcement.ephemeral_pub_key.clone());
        if self.miss_cache.lock().get(&cache_key).is_some() {
            return Ok(None);
        }

        let ephemeral_pk = CompressedPublicKey::from_bytes(&announcement.ephemeral_pub_key)?;
        let expected_tag = compute_view_tag(&self.config.viewing_private_key, &ephemeral_pk)?;
        if expected_tag != view_tag {
            self.miss_cache.lock().put(cache_key, ());
            return Ok(None);
        }

        // The tag matched but 1 in 256 foreign announcements collide;
        // the address derivation is the real test
        let ours = self.generator.verify(
            announcement.stealth_address,
            &ephemeral_pk,
            &self.config.viewing_private_key,
            &self.config.spending_public_key,
        )?;
        if !ours {
            return Ok(None);
        }

        let balance = self.rpc.balance(announcement.stealth_address).await?;
        if balance.is_zero() {
            debug!(
                stealth_address = ?announcement.stealth_address,
                "announcement verified but address unfunded"
            );
            return Ok(None);
        }

        Ok(Some(StealthPayment {
            stealth_address: announcement.stealth_address,
            ephemeral_pub_key: ephemeral_pk,
            view_tag,
            block_number: announcement.block_number,
            transaction_hash: announcement.transaction_hash,
            amount: Some(balance),
            token_address: None,
            metadata: (announcement.metadata.len() > 1)
                .then(|| announcement.metadata[1..].to_vec()),
        }))
    }
}
