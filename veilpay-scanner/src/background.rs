//! Scheduled background scanning.
//!
//! Wraps a [`StealthPaymentScanner`] in a tokio task that scans on a fixed
//! interval, records detections in payment history, decrypts memos when
//! possible, and fans out to webhooks and callbacks. One instance serves
//! one stealth identity; independent identities run independent instances.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ethers::types::Address;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use veilpay_core::constants::DEFAULT_SCAN_INTERVAL_MS;
use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::{EncryptedMetadata, PaymentHistoryEntry, PaymentStatus, StealthPayment};
use veilpay_crypto::MetadataCipher;
use veilpay_history::PaymentHistoryManager;
use veilpay_webhook::WebhookNotifier;

use crate::scanner::StealthPaymentScanner;

/// Invoked for every newly recorded payment.
pub type PaymentCallback = Arc<dyn Fn(&PaymentHistoryEntry) + Send + Sync>;
/// Invoked when a scheduled scan fails; the schedule keeps running.
pub type ErrorCallback = Arc<dyn Fn(&VeilpayError) + Send + Sync>;

struct RunningTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Everything a scan pass needs, shared with the scanning task.
struct ScanContext {
    scanner: Arc<StealthPaymentScanner>,
    history: Arc<PaymentHistoryManager>,
    webhook: Option<Arc<WebhookNotifier>>,
    cipher: MetadataCipher,
    wallet_address: Address,
    on_payment: Option<PaymentCallback>,
    on_error: Option<ErrorCallback>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BACKGROUND SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Periodic scanner for one wallet's stealth identity.
///
/// `start` runs an immediate scan and then repeats on the configured
/// interval. Scans are serialized by the single task; `stop` signals
/// shutdown and waits for any in-flight scan to finish.
pub struct BackgroundScanner {
    scanner: Arc<StealthPaymentScanner>,
    history: Arc<PaymentHistoryManager>,
    webhook: Option<Arc<WebhookNotifier>>,
    wallet_address: Option<Address>,
    interval: Duration,
    on_payment: Option<PaymentCallback>,
    on_error: Option<ErrorCallback>,
    state: Mutex<Option<RunningTask>>,
}

impl std::fmt::Debug for BackgroundScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundScanner")
            .field("wallet_address", &self.wallet_address)
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

impl BackgroundScanner {
    /// Creates a stopped background scanner with the default interval.
    pub fn new(scanner: Arc<StealthPaymentScanner>, history: Arc<PaymentHistoryManager>) -> Self {
        Self {
            scanner,
            history,
            webhook: None,
            wallet_address: None,
            interval: Duration::from_millis(DEFAULT_SCAN_INTERVAL_MS),
            on_payment: None,
            on_error: None,
            state: Mutex::new(None),
        }
    }

    /// Sets the wallet that owns detected payments. Required before
    /// `start` or `scan_now`.
    pub fn with_wallet_address(mut self, address: Address) -> Self {
        self.wallet_address = Some(address);
        self
    }

    /// Attaches a webhook notifier for `payment.detected` events.
    pub fn with_webhook(mut self, webhook: Arc<WebhookNotifier>) -> Self {
        self.webhook = Some(webhook);
        self
    }

    /// Overrides the scan interval.
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Registers a callback for newly recorded payments.
    pub fn on_payment(mut self, callback: PaymentCallback) -> Self {
        self.on_payment = Some(callback);
        self
    }

    /// Registers a callback for scan failures.
    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    /// Whether the scanning task is running.
    pub fn is_running(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Starts the scanning task: one immediate scan, then every interval.
    ///
    /// Calling `start` while running is a logged no-op.
    ///
    /// # Errors
    /// `ConfigError` when no wallet address is configured.
    pub fn start(&self) -> Result<()> {
        let wallet = self.wallet_address.ok_or_else(|| {
            VeilpayError::ConfigError("wallet address required for background scanning".into())
        })?;

        let mut state = self.state.lock();
        if state.is_some() {
            warn!("background scanner already running");
            return Ok(());
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let ctx = Arc::new(self.context(wallet));
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The interval's first tick is immediate: consume it and run
            // the startup scan before entering the schedule
            ticker.tick().await;
            Self::run_scan(&ctx).await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::run_scan(&ctx).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        *state = Some(RunningTask { shutdown_tx, handle });
        info!(wallet = ?wallet, "background scanner started");
        Ok(())
    }

    /// Stops the scanning task, waiting for an in-flight scan to finish.
    /// Idempotent.
    pub async fn stop(&self) {
        let task = self.state.lock().take();
        if let Some(task) = task {
            let _ = task.shutdown_tx.send(true);
            if let Err(e) = task.handle.await {
                error!(error = %e, "background scanner task panicked");
            }
            info!("background scanner stopped");
        }
    }

    /// Runs one scan pass immediately, outside the schedule.
    ///
    /// # Errors
    /// `ConfigError` without a wallet address; scan errors propagate.
    pub async fn scan_now(&self) -> Result<Vec<PaymentHistoryEntry>> {
        let wallet = self.wallet_address.ok_or_else(|| {
            VeilpayError::ConfigError("wallet address required for scanning".into())
        })?;
        Self::perform_scan(&self.context(wallet)).await
    }

    fn context(&self, wallet: Address) -> ScanContext {
        ScanContext {
            scanner: Arc::clone(&self.scanner),
            history: Arc::clone(&self.history),
            webhook: self.webhook.clone(),
            cipher: MetadataCipher::new(),
            wallet_address: wallet,
            on_payment: self.on_payment.clone(),
            on_error: self.on_error.clone(),
        }
    }

    async fn run_scan(ctx: &ScanContext) {
        match Self::perform_scan(ctx).await {
            Ok(recorded) if !recorded.is_empty() => {
                info!(count = recorded.len(), "scan recorded new payments");
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "scheduled scan failed");
                if let Some(callback) = &ctx.on_error {
                    callback(&e);
                }
            }
        }
    }

    /// One scan pass: detect, dedup, decrypt, record, notify.
    async fn perform_scan(ctx: &ScanContext) -> Result<Vec<PaymentHistoryEntry>> {
        let result = ctx.scanner.scan_new_payments().await?;
        let mut recorded = Vec::new();

        for payment in result.payments {
            // Already recorded on an earlier pass or explicit range scan
            if ctx
                .history
                .get_payment_by_stealth_address(payment.stealth_address)
                .is_some()
            {
                continue;
            }

            let entry = Self::build_entry(ctx, payment);
            ctx.history.add_payment(entry.clone());

            if let Some(webhook) = &ctx.webhook {
                webhook.notify_payment_detected(&entry).await;
            }
            if let Some(callback) = &ctx.on_payment {
                callback(&entry);
            }
            recorded.push(entry);
        }

        Ok(recorded)
    }

    fn build_entry(ctx: &ScanContext, payment: StealthPayment) -> PaymentHistoryEntry {
        // Memo decryption is best-effort: metadata may be absent, foreign,
        // or not a memo at all
        let decrypted_memo = payment.metadata.as_deref().and_then(|bytes| {
            let encrypted: EncryptedMetadata = serde_json::from_slice(bytes).ok()?;
            match ctx.cipher.decrypt_memo(
                &encrypted,
                &ctx.scanner.config().viewing_private_key,
            ) {
                Ok(memo) => Some(memo),
                Err(e) => {
                    debug!(error = %e, "metadata present but memo decryption failed");
                    None
                }
            }
        });

        PaymentHistoryEntry {
            id: PaymentHistoryEntry::make_id(payment.transaction_hash, payment.stealth_address),
            stealth_address: payment.stealth_address,
            user_wallet_address: ctx.wallet_address,
            ephemeral_pub_key: payment.ephemeral_pub_key,
            view_tag: payment.view_tag,
            amount: payment.amount.unwrap_or_default(),
            token_address: payment.token_address,
            transaction_hash: payment.transaction_hash,
            block_number: payment.block_number,
            timestamp: Utc::now().timestamp_millis() as u64,
            status: PaymentStatus::Pending,
            metadata: payment.metadata,
            decrypted_memo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{H256, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use veilpay_core::config::ScanningConfig;
    use veilpay_core::types::{AnnouncementLog, CompressedPublicKey, StealthPrivateKey, TransactionMemo};
    use veilpay_webhook::WebhookConfig;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::rpc::MemoryRpc;

    const SPENDING_PK: &str = "022cc8d6c3d64751d9a7d671e71a7787410da2a225b3c3d9821d68b3901ef17523";
    const VIEWING_SK: &str = "2e5e5a073aae656c4e98dd5e9eafcc09321907c5f45f11848874c48a37adf8ef";
    const VIEWING_PK: &str = "03dc5e83da6814f01636c7a651ec24b09447ffc559ddf098055ac4f54e77fe81f6";
    const EPHEMERAL_PK: &str = "03bb5cbf216d4fb19c133f5afa0916b31cac8dc2918fc884bf6e31e07b5ddbcc42";
    const STEALTH_ADDRESS: &str = "6aa8e6885d83bf5a75ce26527dbcd145479ad694";
    const VIEW_TAG: u8 = 0xE1;

    fn stealth_address() -> Address {
        Address::from_slice(&hex::decode(STEALTH_ADDRESS).unwrap())
    }

    fn announcement(memo_payload: Option<Vec<u8>>) -> AnnouncementLog {
        let mut metadata = vec![VIEW_TAG];
        if let Some(payload) = memo_payload {
            metadata.extend(payload);
        }
        AnnouncementLog {
            scheme_id: U256::one(),
            stealth_address: stealth_address(),
            caller: Address::repeat_byte(0x50),
            ephemeral_pub_key: hex::decode(EPHEMERAL_PK).unwrap(),
            metadata,
            block_number: 10,
            transaction_hash: H256::repeat_byte(0x0A),
        }
    }

    fn scanner_over(rpc: Arc<MemoryRpc>) -> Arc<StealthPaymentScanner> {
        let config = ScanningConfig::new(
            StealthPrivateKey::from_hex(VIEWING_SK).unwrap(),
            CompressedPublicKey::from_hex(SPENDING_PK).unwrap(),
        );
        Arc::new(StealthPaymentScanner::new(config, rpc).unwrap())
    }

    fn funded_rpc(memo_payload: Option<Vec<u8>>) -> Arc<MemoryRpc> {
        let rpc = Arc::new(MemoryRpc::new());
        rpc.push_announcement(announcement(memo_payload));
        rpc.set_balance(stealth_address(), U256::from(500u64));
        rpc
    }

    #[tokio::test]
    async fn test_start_requires_wallet_address() {
        let rpc = funded_rpc(None);
        let scanner = BackgroundScanner::new(scanner_over(rpc), Arc::new(PaymentHistoryManager::new()));
        assert!(matches!(
            scanner.start(),
            Err(VeilpayError::ConfigError(_))
        ));
        assert!(!scanner.is_running());
    }

    #[tokio::test]
    async fn test_scan_now_records_and_dedups() {
        let rpc = funded_rpc(None);
        let history = Arc::new(PaymentHistoryManager::new());
        let wallet = Address::repeat_byte(0x0F);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);

        let scanner = BackgroundScanner::new(scanner_over(Arc::clone(&rpc)), Arc::clone(&history))
            .with_wallet_address(wallet)
            .on_payment(Arc::new(move |_| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }));

        let recorded = scanner.scan_now().await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].user_wallet_address, wallet);
        assert_eq!(history.len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        // The announcement reappears on an overlapping rescan; history
        // already knows the stealth address
        rpc.push_announcement(announcement(None));
        let recorded = scanner.scan_now().await.unwrap();
        assert!(recorded.is_empty());
        assert_eq!(history.len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_memo_decrypted_when_present() {
        let cipher = MetadataCipher::new();
        let viewing_pk = CompressedPublicKey::from_hex(VIEWING_PK).unwrap();
        let memo = TransactionMemo::new("coffee fund", 1_700_000_000_000);
        let encrypted = cipher.encrypt_memo(&memo, &viewing_pk).unwrap();
        let payload = serde_json::to_vec(&encrypted).unwrap();

        let rpc = funded_rpc(Some(payload));
        let scanner = BackgroundScanner::new(scanner_over(rpc), Arc::new(PaymentHistoryManager::new()))
            .with_wallet_address(Address::repeat_byte(0x0F));

        let recorded = scanner.scan_now().await.unwrap();
        assert_eq!(recorded[0].decrypted_memo, Some(memo));
    }

    #[tokio::test]
    async fn test_undecryptable_metadata_is_tolerated() {
        let rpc = funded_rpc(Some(b"opaque bytes".to_vec()));
        let scanner = BackgroundScanner::new(scanner_over(rpc), Arc::new(PaymentHistoryManager::new()))
            .with_wallet_address(Address::repeat_byte(0x0F));

        let recorded = scanner.scan_now().await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].decrypted_memo.is_none());
        assert_eq!(recorded[0].metadata, Some(b"opaque bytes".to_vec()));
    }

    #[tokio::test]
    async fn test_start_scans_then_stop_joins() {
        let rpc = funded_rpc(None);
        let history = Arc::new(PaymentHistoryManager::new());
        let scanner = BackgroundScanner::new(scanner_over(rpc), Arc::clone(&history))
            .with_wallet_address(Address::repeat_byte(0x0F))
            .with_scan_interval(Duration::from_secs(3600));

        scanner.start().unwrap();
        assert!(scanner.is_running());
        // Second start is a no-op
        scanner.start().unwrap();

        // stop() waits for the startup scan, so the payment is recorded
        scanner.stop().await;
        assert!(!scanner.is_running());
        assert_eq!(history.len(), 1);

        // Stopping again is a no-op
        scanner.stop().await;
    }

    #[tokio::test]
    async fn test_scan_errors_reach_error_callback() {
        let rpc = funded_rpc(None);
        rpc.set_failing(true);
        let errors = Arc::new(AtomicUsize::new(0));
        let errors_clone = Arc::clone(&errors);

        let scanner = BackgroundScanner::new(scanner_over(rpc), Arc::new(PaymentHistoryManager::new()))
            .with_wallet_address(Address::repeat_byte(0x0F))
            .with_scan_interval(Duration::from_secs(3600))
            .on_error(Arc::new(move |_| {
                errors_clone.fetch_add(1, Ordering::SeqCst);
            }));

        scanner.start().unwrap();
        scanner.stop().await;
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_webhook_notified_on_detection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("payment.detected"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let webhook = Arc::new(WebhookNotifier::new(WebhookConfig::new(server.uri())).unwrap());
        let rpc = funded_rpc(None);
        let scanner = BackgroundScanner::new(scanner_over(rpc), Arc::new(PaymentHistoryManager::new()))
            .with_wallet_address(Address::repeat_byte(0x0F))
            .with_webhook(webhook);

        let recorded = scanner.scan_now().await.unwrap();
        assert_eq!(recorded.len(), 1);
    }
}
