//! # Veilpay Webhook
//!
//! HMAC-signed webhook delivery for payment lifecycle events.
//!
//! Payloads are signed with HMAC-SHA256 in the `X-Veilpay-Signature`
//! header when a secret is configured. Failed deliveries enter a bounded
//! retry queue; a payload that exhausts its budget is handed to the
//! dead-letter hook instead of looping forever.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

mod notifier;
mod payload;

pub use notifier::{DeadLetterHook, WebhookConfig, WebhookNotifier};
pub use payload::{WebhookEvent, WebhookPayload, WebhookPaymentInfo};
