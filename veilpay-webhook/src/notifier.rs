//! Webhook delivery with signing and bounded retries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use parking_lot::{Mutex, RwLock};
use sha2::Sha256;
use tracing::{debug, error, warn};

use veilpay_core::constants::{
    DEFAULT_WEBHOOK_RETRIES, DEFAULT_WEBHOOK_TIMEOUT_MS, WEBHOOK_SIGNATURE_HEADER,
};
use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::PaymentHistoryEntry;

use crate::payload::{WebhookEvent, WebhookPayload};

type HmacSha256 = Hmac<Sha256>;

/// Callback invoked when a payload exhausts its retry budget.
pub type DeadLetterHook = Arc<dyn Fn(&WebhookPayload) + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Webhook endpoint configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Endpoint URL payloads are POSTed to.
    pub url: String,
    /// Shared secret for HMAC-SHA256 signing; unsigned when `None`.
    pub secret: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Extra delivery attempts after the initial failure.
    pub max_retries: u32,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: None,
            timeout_ms: DEFAULT_WEBHOOK_TIMEOUT_MS,
            max_retries: DEFAULT_WEBHOOK_RETRIES,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFIER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct RetryItem {
    payload: WebhookPayload,
    retries_left: u32,
}

/// Delivers signed webhook payloads with a bounded retry queue.
///
/// Delivery failures are never fatal to the caller: a failed payload is
/// queued with a budget of `max_retries` further attempts, consumed one per
/// `process_retry_queue` pass. A payload that exhausts its budget goes to
/// the dead-letter hook and is dropped.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
    retry_queue: Mutex<VecDeque<RetryItem>>,
    dead_letter_count: AtomicU64,
    dead_letter_hook: RwLock<Option<DeadLetterHook>>,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("url", &self.config.url)
            .field("signed", &self.config.secret.is_some())
            .field("retry_queue_len", &self.retry_queue_len())
            .finish()
    }
}

impl WebhookNotifier {
    /// Creates a notifier with its own HTTP client.
    ///
    /// # Errors
    /// Returns `HttpError` when the client cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| VeilpayError::HttpError(e.to_string()))?;

        Ok(Self {
            config,
            client,
            retry_queue: Mutex::new(VecDeque::new()),
            dead_letter_count: AtomicU64::new(0),
            dead_letter_hook: RwLock::new(None),
        })
    }

    /// Installs the hook invoked when a payload exhausts its retries.
    pub fn set_dead_letter_hook(&self, hook: DeadLetterHook) {
        *self.dead_letter_hook.write() = Some(hook);
    }

    /// Attempts delivery once; on failure the payload joins the retry queue.
    ///
    /// Returns whether the immediate attempt succeeded. Never returns an
    /// error: webhook trouble must not break payment processing.
    pub async fn send_webhook(&self, payload: WebhookPayload) -> bool {
        match self.post_once(&payload).await {
            Ok(()) => {
                debug!(event = ?payload.event, "webhook delivered");
                true
            }
            Err(e) => {
                warn!(event = ?payload.event, error = %e, "webhook delivery failed");
                if self.config.max_retries == 0 {
                    self.dead_letter(&payload);
                } else {
                    self.retry_queue.lock().push_back(RetryItem {
                        payload,
                        retries_left: self.config.max_retries,
                    });
                }
                false
            }
        }
    }

    /// Runs one retry pass: each queued payload gets a single attempt.
    ///
    /// Successes leave the queue; failures stay with a decremented budget,
    /// or dead-letter at zero. Returns the number delivered this pass.
    pub async fn process_retry_queue(&self) -> usize {
        let items: Vec<RetryItem> = self.retry_queue.lock().drain(..).collect();
        let mut delivered = 0;

        for mut item in items {
            match self.post_once(&item.payload).await {
                Ok(()) => {
                    debug!(event = ?item.payload.event, "webhook retry delivered");
                    delivered += 1;
                }
                Err(e) => {
                    item.retries_left -= 1;
                    if item.retries_left == 0 {
                        warn!(error = %e, "webhook retries exhausted");
                        self.dead_letter(&item.payload);
                    } else {
                        self.retry_queue.lock().push_back(item);
                    }
                }
            }
        }

        delivered
    }

    /// Number of payloads awaiting retry.
    pub fn retry_queue_len(&self) -> usize {
        self.retry_queue.lock().len()
    }

    /// Number of payloads dropped after exhausting retries.
    pub fn dead_letter_count(&self) -> u64 {
        self.dead_letter_count.load(Ordering::Relaxed)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Notify helpers
    // ───────────────────────────────────────────────────────────────────────────

    /// Sends a `payment.detected` event.
    pub async fn notify_payment_detected(&self, payment: &PaymentHistoryEntry) -> bool {
        self.send_webhook(WebhookPayload::new(WebhookEvent::PaymentDetected, payment))
            .await
    }

    /// Sends a `payment.claimed` event.
    pub async fn notify_payment_claimed(&self, payment: &PaymentHistoryEntry) -> bool {
        self.send_webhook(WebhookPayload::new(WebhookEvent::PaymentClaimed, payment))
            .await
    }

    /// Sends a `payment.failed` event with an error description.
    pub async fn notify_payment_failed(
        &self,
        payment: &PaymentHistoryEntry,
        error_message: impl Into<String>,
    ) -> bool {
        self.send_webhook(
            WebhookPayload::new(WebhookEvent::PaymentFailed, payment).with_error(error_message),
        )
        .await
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Signing
    // ───────────────────────────────────────────────────────────────────────────

    /// Verifies an `X-Veilpay-Signature` value against a request body.
    ///
    /// Comparison happens inside the HMAC verification and is
    /// constant-time. Malformed hex verifies as false.
    pub fn verify_signature(body: &[u8], signature_hex: &str, secret: &str) -> bool {
        let signature_hex = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
        let Ok(signature) = hex::decode(signature_hex) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body);
        mac.verify_slice(&signature).is_ok()
    }

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    async fn post_once(&self, payload: &WebhookPayload) -> Result<()> {
        let body = serde_json::to_vec(payload)?;

        let mut request = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json");
        if let Some(secret) = &self.config.secret {
            request = request.header(WEBHOOK_SIGNATURE_HEADER, Self::sign(&body, secret));
        }

        let response = request.body(body).send().await.map_err(|e| {
            if e.is_timeout() {
                VeilpayError::ConnectionTimeout(self.config.url.clone())
            } else {
                VeilpayError::HttpError(e.to_string())
            }
        })?;

        response
            .error_for_status()
            .map_err(|e| VeilpayError::HttpError(e.to_string()))?;
        Ok(())
    }

    fn dead_letter(&self, payload: &WebhookPayload) {
        self.dead_letter_count.fetch_add(1, Ordering::Relaxed);
        error!(event = ?payload.event, "webhook payload dead-lettered");
        if let Some(hook) = self.dead_letter_hook.read().clone() {
            hook(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Address, H256, U256};
    use std::sync::atomic::AtomicUsize;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use veilpay_core::constants::COMPRESSED_PUBLIC_KEY_SIZE;
    use veilpay_core::types::{CompressedPublicKey, PaymentStatus};

    fn sample_entry() -> PaymentHistoryEntry {
        let tx = H256::repeat_byte(0x01);
        let addr = Address::repeat_byte(0x02);
        let mut pk = [0x11; COMPRESSED_PUBLIC_KEY_SIZE];
        pk[0] = 0x02;
        PaymentHistoryEntry {
            id: PaymentHistoryEntry::make_id(tx, addr),
            stealth_address: addr,
            user_wallet_address: Address::repeat_byte(0x03),
            ephemeral_pub_key: CompressedPublicKey::from_array(pk),
            view_tag: 0x42,
            amount: U256::from(1000),
            token_address: None,
            transaction_hash: tx,
            block_number: 1,
            timestamp: 1_700_000_000_000,
            status: PaymentStatus::Pending,
            metadata: None,
            decrypted_memo: None,
        }
    }

    #[tokio::test]
    async fn test_successful_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(WebhookConfig::new(format!("{}/hook", server.uri()))).unwrap();
        assert!(notifier.notify_payment_detected(&sample_entry()).await);
        assert_eq!(notifier.retry_queue_len(), 0);
    }

    #[tokio::test]
    async fn test_signature_header_present_when_secret_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists(WEBHOOK_SIGNATURE_HEADER))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = WebhookConfig::new(server.uri()).with_secret("team-secret");
        let notifier = WebhookNotifier::new(config).unwrap();
        assert!(notifier.notify_payment_claimed(&sample_entry()).await);
    }

    #[tokio::test]
    async fn test_failure_enqueues_for_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(WebhookConfig::new(server.uri())).unwrap();
        assert!(!notifier.notify_payment_detected(&sample_entry()).await);
        assert_eq!(notifier.retry_queue_len(), 1);
    }

    #[tokio::test]
    async fn test_retry_bound_then_dead_letter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            // 1 initial attempt + exactly 2 retries
            .expect(3)
            .mount(&server)
            .await;

        let config = WebhookConfig::new(server.uri()).with_max_retries(2);
        let notifier = WebhookNotifier::new(config).unwrap();

        let dead = Arc::new(AtomicUsize::new(0));
        let dead_clone = Arc::clone(&dead);
        notifier.set_dead_letter_hook(Arc::new(move |_| {
            dead_clone.fetch_add(1, Ordering::SeqCst);
        }));

        notifier.notify_payment_detected(&sample_entry()).await;
        assert_eq!(notifier.retry_queue_len(), 1);

        assert_eq!(notifier.process_retry_queue().await, 0);
        assert_eq!(notifier.retry_queue_len(), 1);

        assert_eq!(notifier.process_retry_queue().await, 0);
        assert_eq!(notifier.retry_queue_len(), 0);
        assert_eq!(notifier.dead_letter_count(), 1);
        assert_eq!(dead.load(Ordering::SeqCst), 1);

        // Nothing left; further passes are no-ops
        assert_eq!(notifier.process_retry_queue().await, 0);
        assert_eq!(notifier.dead_letter_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_recovery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(WebhookConfig::new(server.uri())).unwrap();
        assert!(!notifier.notify_payment_detected(&sample_entry()).await);
        assert_eq!(notifier.process_retry_queue().await, 1);
        assert_eq!(notifier.retry_queue_len(), 0);
        assert_eq!(notifier.dead_letter_count(), 0);
    }

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"event":"payment.detected"}"#;
        let signature = WebhookNotifier::sign(body, "secret");
        assert!(WebhookNotifier::verify_signature(body, &signature, "secret"));
        assert!(!WebhookNotifier::verify_signature(body, &signature, "other"));
        assert!(!WebhookNotifier::verify_signature(b"tampered", &signature, "secret"));
        assert!(!WebhookNotifier::verify_signature(body, "not-hex", "secret"));
    }
}
