//! Payment webhook ingestion.
//!
//! Every delivery runs the same gauntlet: signature check, replay check,
//! event type filter, provider re-verification, then the balance change and
//! idempotency record in one transaction. Deliveries that fail verification
//! are recorded and acknowledged so the provider stops retrying them;
//! only transport-level problems answer with a retryable status.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use sea_orm::ActiveEnum;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::provider::ProviderError;
use crate::routes::credit_error_response;
use scriva_core::credit::CreditError;
use scriva_core::webhook::{
    PaymentEvent, PaymentEventKind, WebhookError, parse_payment_event, verify_signature,
};
use scriva_db::WebhookEventRepository;
use scriva_db::repositories::WebhookRecordError;

/// Header carrying the hex-encoded HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Creates the webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/payments", post(handle_payment_webhook))
}

/// The two event kinds that move credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerifiedFlow {
    Purchase,
    Refund,
}

impl VerifiedFlow {
    /// Provider-side order state this flow requires.
    const fn expected_order_status(self) -> &'static str {
        match self {
            Self::Purchase => "paid",
            Self::Refund => "refunded",
        }
    }
}

/// Maps a pre-verification rejection onto its HTTP response.
fn reject(e: &WebhookError) -> Response {
    let (status, code) = match e {
        WebhookError::MissingSignature => (StatusCode::UNAUTHORIZED, "MISSING_SIGNATURE"),
        WebhookError::SignatureInvalid => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
        WebhookError::MalformedPayload(_) => (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD"),
    };
    (
        status,
        Json(json!({ "error": code, "message": e.to_string() })),
    )
        .into_response()
}

/// POST `/webhooks/payments` - Payment provider event sink.
async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // 1. Signature over the raw body; failures are not recorded.
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return reject(&WebhookError::MissingSignature);
    };

    if let Err(e) = verify_signature(&state.payment.webhook_secret, &body, signature) {
        warn!("Webhook delivery with invalid signature rejected");
        return reject(&e);
    }

    let event = match parse_payment_event(&body) {
        Ok(event) => event,
        Err(e) => return reject(&e),
    };

    // 2. Replay check on (event_type, provider_event_id).
    let webhooks = WebhookEventRepository::new((*state.db).clone());
    match webhooks.find(&event.event_type, &event.event_id).await {
        Ok(Some(_)) => return ack_duplicate(),
        Ok(None) => {}
        Err(e) => return credit_error_response(&e),
    }

    // 3. Type filter: unhandled kinds are recorded and acknowledged.
    let (flow, data) = match (event.kind, &event.data) {
        (PaymentEventKind::PaymentCompleted, Some(data)) => (VerifiedFlow::Purchase, data),
        (PaymentEventKind::PaymentRefunded, Some(data)) => (VerifiedFlow::Refund, data),
        (PaymentEventKind::Unknown, _) | (_, None) => {
            return record_skipped_and_ack(&webhooks, &event).await;
        }
    };

    // 4. Re-verify the order against the provider, before any transaction.
    let order = match state.provider.fetch_order(&data.order_id).await {
        Ok(order) => order,
        Err(ProviderError::OrderNotFound(_)) => {
            return record_error_and_ack(
                &webhooks,
                &event,
                Some(data.account_id),
                "referenced order not found at provider",
            )
            .await;
        }
        Err(ProviderError::Request(e)) => {
            // Nothing recorded: the provider should retry once we can verify.
            warn!(error = %e, "Payment provider unreachable during webhook verification");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "PROVIDER_UNAVAILABLE",
                    "message": "Order verification is temporarily unavailable"
                })),
            )
                .into_response();
        }
    };

    let mismatch = if order.merchant_id != state.payment.merchant_id {
        Some("order belongs to a different merchant")
    } else if order.status != flow.expected_order_status() {
        Some("order state does not match the event")
    } else if order.credit_amount != data.credit_amount {
        Some("order credit amount does not match the payload")
    } else {
        None
    };

    if let Some(reason) = mismatch {
        warn!(
            order_id = %order.id,
            event_id = %event.event_id,
            reason,
            "Webhook payload failed provider verification"
        );
        return record_error_and_ack(&webhooks, &event, Some(data.account_id), reason).await;
    }

    // 5/6. Apply the balance change and the idempotency record atomically.
    let result = match flow {
        VerifiedFlow::Purchase => {
            webhooks
                .apply_purchase(
                    &event.event_type,
                    &event.event_id,
                    data.account_id,
                    data.credit_amount,
                    &data.order_id,
                )
                .await
        }
        VerifiedFlow::Refund => {
            webhooks
                .apply_refund(
                    &event.event_type,
                    &event.event_id,
                    data.account_id,
                    data.credit_amount,
                    &data.order_id,
                )
                .await
        }
    };

    match result {
        Ok(record) => {
            info!(
                event_id = %event.event_id,
                account_id = %data.account_id,
                outcome = %record.outcome.to_value(),
                "Webhook event applied"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "received": true,
                    "duplicate": false,
                    "outcome": record.outcome.to_value(),
                    "detail": record.detail,
                })),
            )
                .into_response()
        }
        // A concurrent delivery won the unique-key race; this one is a replay.
        Err(WebhookRecordError::Duplicate) => ack_duplicate(),
        Err(WebhookRecordError::Credit(CreditError::AccountNotFound(account_id))) => {
            record_error_and_ack(
                &webhooks,
                &event,
                Some(account_id),
                "no credit account for the referenced user",
            )
            .await
        }
        Err(WebhookRecordError::Credit(e)) => credit_error_response(&e),
    }
}

fn ack_duplicate() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "received": true, "duplicate": true })),
    )
        .into_response()
}

async fn record_skipped_and_ack(webhooks: &WebhookEventRepository, event: &PaymentEvent) -> Response {
    match webhooks
        .record_skipped(
            &event.event_type,
            &event.event_id,
            event.data.as_ref().map(|d| d.account_id),
            "unhandled event type",
        )
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "received": true,
                "duplicate": false,
                "outcome": "skipped",
            })),
        )
            .into_response(),
        Err(WebhookRecordError::Duplicate) => ack_duplicate(),
        Err(WebhookRecordError::Credit(e)) => credit_error_response(&e),
    }
}

async fn record_error_and_ack(
    webhooks: &WebhookEventRepository,
    event: &PaymentEvent,
    account_id: Option<Uuid>,
    detail: &str,
) -> Response {
    match webhooks
        .record_error(&event.event_type, &event.event_id, account_id, detail)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "received": true,
                "duplicate": false,
                "outcome": "error",
                "detail": detail,
            })),
        )
            .into_response(),
        Err(WebhookRecordError::Duplicate) => ack_duplicate(),
        Err(WebhookRecordError::Credit(e)) => credit_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::provider::MockPaymentProviderClient;
    use crate::test_util::{TEST_WEBHOOK_SECRET, test_state};
    use scriva_core::webhook::sign_payload;

    fn webhook_router() -> Router {
        let state = test_state(MockPaymentProviderClient::new());
        routes().with_state(state)
    }

    fn purchase_body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "event_type": "payment.completed",
            "event_id": "evt_1",
            "data": {
                "account_id": Uuid::new_v4(),
                "credit_amount": 500,
                "order_id": "ord_1"
            }
        }))
        .unwrap()
    }

    async fn post_webhook(router: Router, body: Vec<u8>, signature: Option<&str>) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri("/webhooks/payments")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        router
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    async fn error_code(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_missing_signature_rejected_before_any_work() {
        let response = post_webhook(webhook_router(), purchase_body(), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "MISSING_SIGNATURE");
    }

    #[tokio::test]
    async fn test_wrong_signature_rejected() {
        let body = purchase_body();
        let signature = sign_payload("some-other-secret", &body);
        let response = post_webhook(webhook_router(), body, Some(&signature)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn test_signature_over_tampered_body_rejected() {
        let signature = sign_payload(TEST_WEBHOOK_SECRET, &purchase_body());
        let tampered = purchase_body(); // new random account id
        let response = post_webhook(webhook_router(), tampered, Some(&signature)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected_after_signature() {
        let body = b"not json at all".to_vec();
        let signature = sign_payload(TEST_WEBHOOK_SECRET, &body);
        let response = post_webhook(webhook_router(), body, Some(&signature)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "MALFORMED_PAYLOAD");
    }

    #[tokio::test]
    async fn test_known_type_with_invalid_amount_rejected() {
        let body = serde_json::to_vec(&json!({
            "event_type": "payment.completed",
            "event_id": "evt_2",
            "data": {
                "account_id": Uuid::new_v4(),
                "credit_amount": 0,
                "order_id": "ord_2"
            }
        }))
        .unwrap();
        let signature = sign_payload(TEST_WEBHOOK_SECRET, &body);
        let response = post_webhook(webhook_router(), body, Some(&signature)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
