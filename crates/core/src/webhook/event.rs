//! Typed parsing of inbound payment events.

use serde::Deserialize;
use uuid::Uuid;

use super::WebhookError;

/// Event types this system acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// The provider confirmed a payment; purchased credit is granted.
    PaymentCompleted,
    /// The provider refunded a payment; purchased credit is reclaimed.
    PaymentRefunded,
    /// Anything else; recorded as skipped and acknowledged.
    Unknown,
}

impl PaymentEventKind {
    fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "payment.completed" => Self::PaymentCompleted,
            "payment.refunded" => Self::PaymentRefunded,
            _ => Self::Unknown,
        }
    }
}

/// Custom payload attached to payment events.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventData {
    /// The credit account to apply the event to.
    pub account_id: Uuid,
    /// Credits the order is worth.
    pub credit_amount: i64,
    /// Provider order id, re-verified against the provider API.
    pub order_id: String,
}

/// A parsed provider event.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    /// Raw event type string, preserved for the idempotency key and for
    /// recording skipped types.
    pub event_type: String,
    /// Provider-assigned event id.
    pub event_id: String,
    /// Classified event kind.
    pub kind: PaymentEventKind,
    /// Payment payload; absent on unrecognized event types.
    pub data: Option<PaymentEventData>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_type: String,
    event_id: String,
    #[serde(default)]
    data: Option<PaymentEventData>,
}

/// Parses the raw webhook body into a typed event.
///
/// Unknown event types parse successfully (so they can be recorded as
/// skipped), but known payment types must carry a complete payload.
///
/// # Errors
///
/// Returns [`WebhookError::MalformedPayload`] if the body is not valid
/// JSON, required identifiers are empty, or a payment event is missing its
/// payload.
pub fn parse_payment_event(body: &[u8]) -> Result<PaymentEvent, WebhookError> {
    let raw: RawEvent = serde_json::from_slice(body)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    if raw.event_id.is_empty() {
        return Err(WebhookError::MalformedPayload(
            "event_id must not be empty".to_string(),
        ));
    }
    if raw.event_type.is_empty() {
        return Err(WebhookError::MalformedPayload(
            "event_type must not be empty".to_string(),
        ));
    }

    let kind = PaymentEventKind::from_event_type(&raw.event_type);

    if kind != PaymentEventKind::Unknown {
        let Some(data) = &raw.data else {
            return Err(WebhookError::MalformedPayload(
                "payment event missing data".to_string(),
            ));
        };
        if data.credit_amount <= 0 {
            return Err(WebhookError::MalformedPayload(
                "credit_amount must be positive".to_string(),
            ));
        }
        if data.order_id.is_empty() {
            return Err(WebhookError::MalformedPayload(
                "order_id must not be empty".to_string(),
            ));
        }
    }

    Ok(PaymentEvent {
        event_type: raw.event_type,
        event_id: raw.event_id,
        kind,
        data: raw.data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_parse_payment_completed() {
        let account_id = Uuid::now_v7();
        let event = parse_payment_event(&body(json!({
            "event_type": "payment.completed",
            "event_id": "evt_123",
            "data": {
                "account_id": account_id,
                "credit_amount": 500,
                "order_id": "ord_42"
            }
        })))
        .unwrap();

        assert_eq!(event.kind, PaymentEventKind::PaymentCompleted);
        assert_eq!(event.event_id, "evt_123");
        let data = event.data.unwrap();
        assert_eq!(data.account_id, account_id);
        assert_eq!(data.credit_amount, 500);
        assert_eq!(data.order_id, "ord_42");
    }

    #[test]
    fn test_parse_payment_refunded() {
        let event = parse_payment_event(&body(json!({
            "event_type": "payment.refunded",
            "event_id": "evt_456",
            "data": {
                "account_id": Uuid::now_v7(),
                "credit_amount": 200,
                "order_id": "ord_42"
            }
        })))
        .unwrap();
        assert_eq!(event.kind, PaymentEventKind::PaymentRefunded);
    }

    #[test]
    fn test_unknown_type_parses_without_data() {
        let event = parse_payment_event(&body(json!({
            "event_type": "subscription.updated",
            "event_id": "evt_789"
        })))
        .unwrap();
        assert_eq!(event.kind, PaymentEventKind::Unknown);
        assert!(event.data.is_none());
    }

    #[test]
    fn test_payment_event_requires_data() {
        let err = parse_payment_event(&body(json!({
            "event_type": "payment.completed",
            "event_id": "evt_123"
        })))
        .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let err = parse_payment_event(&body(json!({
            "event_type": "payment.completed",
            "event_id": "evt_123",
            "data": {
                "account_id": Uuid::now_v7(),
                "credit_amount": 0,
                "order_id": "ord_42"
            }
        })))
        .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            parse_payment_event(b"not json"),
            Err(WebhookError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_empty_event_id_rejected() {
        let err = parse_payment_event(&body(json!({
            "event_type": "payment.completed",
            "event_id": ""
        })))
        .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }
}
