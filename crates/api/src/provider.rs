//! Outbound payment provider client.
//!
//! Webhook payloads are never trusted on their own: before any credit moves,
//! the referenced order is re-fetched from the provider and checked against
//! the payload. The trait seam exists so handlers can be tested against a
//! mock provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use scriva_shared::config::PaymentProviderConfig;

/// An order as the provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderOrder {
    /// Provider-side order id.
    pub id: String,
    /// Merchant the order was placed against.
    pub merchant_id: String,
    /// Order state ("paid", "refunded", ...).
    pub status: String,
    /// Credits the order is worth.
    pub credit_amount: i64,
}

/// Errors from order verification calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no order with this id.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// The provider could not be reached or answered abnormally.
    #[error("provider request failed: {0}")]
    Request(String),
}

/// Client for re-verifying orders against the payment provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProviderClient: Send + Sync {
    /// Fetches the authoritative state of an order.
    async fn fetch_order(&self, order_id: &str) -> Result<ProviderOrder, ProviderError>;
}

/// [`PaymentProviderClient`] backed by the provider's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPaymentProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentProviderClient {
    /// Creates a client from the provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &PaymentProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentProviderClient for HttpPaymentProviderClient {
    async fn fetch_order(&self, order_id: &str) -> Result<ProviderOrder, ProviderError> {
        let url = format!("{}/v1/orders/{order_id}", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::OrderNotFound(order_id.to_string()));
        }

        let response = response
            .error_for_status()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        response
            .json::<ProviderOrder>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))
    }
}
