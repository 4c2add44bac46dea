//! Webhook payload shapes.
//!
//! Everything numeric is stringified so JSON consumers never hit precision
//! issues with 256-bit amounts.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use veilpay_core::types::PaymentHistoryEntry;

/// Payment lifecycle events delivered over webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "payment.detected")]
    PaymentDetected,
    #[serde(rename = "payment.claimed")]
    PaymentClaimed,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
}

/// Stringified view of a payment for webhook consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPaymentInfo {
    pub id: String,
    pub stealth_address: String,
    pub user_wallet_address: String,
    /// Decimal string of the wei amount.
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    pub transaction_hash: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub status: String,
}

/// The body POSTed to the configured webhook URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: WebhookEvent,
    /// Unix milliseconds when this payload was built.
    pub timestamp: u64,
    pub payment: WebhookPaymentInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookPayload {
    /// Builds a payload for an event over a recorded payment.
    pub fn new(event: WebhookEvent, payment: &PaymentHistoryEntry) -> Self {
        Self {
            event,
            timestamp: Utc::now().timestamp_millis() as u64,
            payment: WebhookPaymentInfo {
                id: payment.id.clone(),
                stealth_address: format!("0x{}", hex::encode(payment.stealth_address.as_bytes())),
                user_wallet_address: format!(
                    "0x{}",
                    hex::encode(payment.user_wallet_address.as_bytes())
                ),
                amount: payment.amount.to_string(),
                token_address: payment
                    .token_address
                    .map(|t| format!("0x{}", hex::encode(t.as_bytes()))),
                transaction_hash: format!(
                    "0x{}",
                    hex::encode(payment.transaction_hash.as_bytes())
                ),
                block_number: payment.block_number,
                timestamp: payment.timestamp,
                status: serde_json::to_value(payment.status)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_owned))
                    .unwrap_or_default(),
            },
            error: None,
        }
    }

    /// Attaches an error description (used by `payment.failed`).
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
