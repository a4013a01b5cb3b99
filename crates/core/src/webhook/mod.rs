//! Payment webhook verification and parsing.
//!
//! Inbound provider events are authenticated with an HMAC-SHA256 signature
//! over the raw request body, then parsed into a typed event. Everything
//! here is pure; idempotency and balance application live behind the
//! database seam.

pub mod event;
pub mod signature;

use thiserror::Error;

pub use event::{PaymentEvent, PaymentEventData, PaymentEventKind, parse_payment_event};
pub use signature::{sign_payload, verify_signature};

/// Reasons a webhook delivery is rejected before anything is recorded.
///
/// Failures past this point live elsewhere: provider re-verification errors
/// are the HTTP client's, and credit application errors are the store's.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signature header was supplied.
    #[error("missing webhook signature")]
    MissingSignature,

    /// The signature did not verify against the shared secret.
    #[error("invalid webhook signature")]
    SignatureInvalid,

    /// The request body was not a well-formed event.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
}
