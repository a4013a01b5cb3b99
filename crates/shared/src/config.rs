//! Application configuration management.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Payment provider configuration.
    pub payment_provider: PaymentProviderConfig,
    /// Credit pricing configuration.
    #[serde(default)]
    pub credits: CreditsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

// The section as a whole is optional too: env-only deployments provide no
// [server] table at all.
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for validating tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Payment provider configuration.
///
/// The webhook secret authenticates inbound events; the API key and base URL
/// are used to re-verify orders against the provider before crediting.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentProviderConfig {
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// Base URL of the provider API.
    pub api_base_url: String,
    /// API key for outbound verification calls.
    pub api_key: String,
    /// Merchant ID expected on verified orders.
    pub merchant_id: String,
    /// Timeout for outbound verification calls in seconds.
    #[serde(default = "default_provider_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider_timeout() -> u64 {
    10
}

/// Credit pricing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsConfig {
    /// TTL for the cached pricing settings in seconds.
    #[serde(default = "default_pricing_ttl")]
    pub pricing_ttl_secs: u64,
}

fn default_pricing_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            pricing_ttl_secs: default_pricing_ttl(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SCRIVA").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Validates configuration values that cannot be checked by deserialization.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a required secret is empty.
    pub fn validate(&self) -> AppResult<()> {
        if self.jwt.secret.is_empty() {
            return Err(AppError::Validation("jwt.secret must not be empty".into()));
        }
        if self.payment_provider.webhook_secret.is_empty() {
            return Err(AppError::Validation(
                "payment_provider.webhook_secret must not be empty".into(),
            ));
        }
        if self.payment_provider.merchant_id.is_empty() {
            return Err(AppError::Validation(
                "payment_provider.merchant_id must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_env() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("SCRIVA__DATABASE__URL", Some("postgres://localhost/scriva")),
            ("SCRIVA__JWT__SECRET", Some("test-secret")),
            ("SCRIVA__PAYMENT_PROVIDER__WEBHOOK_SECRET", Some("whsec")),
            (
                "SCRIVA__PAYMENT_PROVIDER__API_BASE_URL",
                Some("https://pay.example.com"),
            ),
            ("SCRIVA__PAYMENT_PROVIDER__API_KEY", Some("pk_test")),
            ("SCRIVA__PAYMENT_PROVIDER__MERCHANT_ID", Some("merch_1")),
        ]
    }

    #[test]
    fn test_load_from_env_with_defaults() {
        temp_env::with_vars(required_env(), || {
            let config = AppConfig::load().unwrap();

            assert_eq!(config.database.url, "postgres://localhost/scriva");
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.database.max_connections, 10);
            assert_eq!(config.jwt.access_token_expiry_secs, 900);
            assert_eq!(config.payment_provider.request_timeout_secs, 10);
            assert_eq!(config.credits.pricing_ttl_secs, 300);
        });
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut vars = required_env();
        vars.push(("SCRIVA__SERVER__PORT", Some("9090")));
        vars.push(("SCRIVA__CREDITS__PRICING_TTL_SECS", Some("60")));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.credits.pricing_ttl_secs, 60);
        });
    }

    #[test]
    fn test_validate_rejects_empty_secrets() {
        let mut vars = required_env();
        vars[2] = ("SCRIVA__PAYMENT_PROVIDER__WEBHOOK_SECRET", Some(""));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().unwrap();
            let err = config.validate().unwrap_err();
            assert_eq!(err.error_code(), "VALIDATION_ERROR");
        });
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        temp_env::with_vars(required_env(), || {
            let config = AppConfig::load().unwrap();
            assert!(config.validate().is_ok());
        });
    }
}
