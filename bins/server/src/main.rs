//! Scriva API Server
//!
//! Main entry point for the Scriva credit ledger service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scriva_api::provider::HttpPaymentProviderClient;
use scriva_api::{AppState, create_router};
use scriva_core::credit::PricingCache;
use scriva_db::connect;
use scriva_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriva=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load and validate configuration
    let config = AppConfig::load().expect("Failed to load configuration");
    config.validate()?;

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Create payment provider client
    let provider = HttpPaymentProviderClient::new(&config.payment_provider)
        .map_err(|e| anyhow::anyhow!("Failed to build payment provider client: {e}"))?;
    info!(
        api_base_url = %config.payment_provider.api_base_url,
        merchant_id = %config.payment_provider.merchant_id,
        "Payment provider client configured"
    );

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        provider: Arc::new(provider),
        pricing_cache: Arc::new(PricingCache::new(Duration::from_secs(
            config.credits.pricing_ttl_secs,
        ))),
        payment: Arc::new(config.payment_provider.clone()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
