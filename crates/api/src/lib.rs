//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for credits, jobs, admin operations, and webhooks
//! - Authentication middleware
//! - The outbound payment provider client

pub mod middleware;
pub mod provider;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use provider::PaymentProviderClient;
use scriva_core::credit::{CreditPricing, PricingCache};
use scriva_db::SettingsRepository;
use scriva_shared::JwtService;
use scriva_shared::config::PaymentProviderConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Payment provider client for order re-verification.
    pub provider: Arc<dyn PaymentProviderClient>,
    /// TTL cache slot for credit pricing.
    pub pricing_cache: Arc<PricingCache>,
    /// Payment provider configuration (webhook secret, merchant id).
    pub payment: Arc<PaymentProviderConfig>,
}

impl AppState {
    /// Returns the current credit pricing, refreshing the cache on expiry.
    ///
    /// Falls back to [`CreditPricing::default`] when no settings row exists;
    /// a load failure is logged and also falls back, without poisoning the
    /// cache.
    pub async fn pricing(&self) -> CreditPricing {
        if let Some(pricing) = self.pricing_cache.get() {
            return pricing;
        }

        match SettingsRepository::new((*self.db).clone())
            .credit_pricing()
            .await
        {
            Ok(loaded) => {
                let pricing = loaded.unwrap_or_default();
                self.pricing_cache.store(pricing);
                pricing
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load credit pricing, using defaults");
                CreditPricing::default()
            }
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::provider::MockPaymentProviderClient;
    use scriva_shared::JwtConfig;
    use std::time::Duration;

    pub(crate) const TEST_JWT_SECRET: &str = "test-secret-key-for-testing";
    pub(crate) const TEST_WEBHOOK_SECRET: &str = "whsec_test";

    /// State over a disconnected database, for handler paths that reject
    /// before touching storage.
    pub(crate) fn test_state(provider: MockPaymentProviderClient) -> AppState {
        AppState {
            db: Arc::new(DatabaseConnection::default()),
            jwt_service: Arc::new(JwtService::new(JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
                access_token_expires_minutes: 15,
            })),
            provider: Arc::new(provider),
            pricing_cache: Arc::new(PricingCache::new(Duration::from_secs(60))),
            payment: Arc::new(PaymentProviderConfig {
                webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
                api_base_url: "https://pay.example.com".to_string(),
                api_key: "pk_test".to_string(),
                merchant_id: "merch_test".to_string(),
                request_timeout_secs: 5,
            }),
        }
    }
}
