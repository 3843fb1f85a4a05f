//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `CINEMA_STORE` prefix and
//! `__` between nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use cinema_storefront::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod database;
mod error;
mod payment;
mod server;
mod webhook;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

pub const ENV_PREFIX: &str = "CINEMA_STORE";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Absent means the in-memory store is used
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    pub payment: PaymentConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present
    /// 2. Reads `CINEMA_STORE__*` variables, `__` separating nested keys
    /// 3. Deserializes into typed sections
    ///
    /// - `CINEMA_STORE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CINEMA_STORE__PAYMENT__CURRENCY=eur` -> `payment.currency = "eur"`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.payment.validate()?;
        self.webhook.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PriceDriftPolicy;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CINEMA_STORE__PAYMENT__STRIPE_API_KEY",
        "CINEMA_STORE__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "CINEMA_STORE__PAYMENT__PRICE_DRIFT_POLICY",
        "CINEMA_STORE__PAYMENT__SESSION_TTL_MINUTES",
        "CINEMA_STORE__DATABASE__URL",
        "CINEMA_STORE__SERVER__PORT",
        "CINEMA_STORE__SERVER__ENVIRONMENT",
        "CINEMA_STORE__WEBHOOK__LOOKUP_ATTEMPTS",
    ];

    fn set_minimal_env() {
        env::set_var("CINEMA_STORE__PAYMENT__STRIPE_API_KEY", "sk_test_xxx");
        env::set_var("CINEMA_STORE__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_minimal_environment() {
        let config = load_with(&[]).unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.payment.currency, "usd");
        assert_eq!(config.payment.session_ttl_minutes, 30);
        assert_eq!(config.payment.price_drift_policy, PriceDriftPolicy::HonorOrderPrice);
        assert_eq!(config.webhook.lookup_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_overrides() {
        let config = load_with(&[
            ("CINEMA_STORE__SERVER__PORT", "9090"),
            ("CINEMA_STORE__SERVER__ENVIRONMENT", "production"),
            ("CINEMA_STORE__DATABASE__URL", "postgresql://localhost/cinema"),
            ("CINEMA_STORE__PAYMENT__PRICE_DRIFT_POLICY", "reject"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert!(config.is_production());
        assert_eq!(
            config.database.as_ref().map(|d| d.url.as_str()),
            Some("postgresql://localhost/cinema")
        );
        assert_eq!(config.payment.price_drift_policy, PriceDriftPolicy::Reject);
    }

    #[test]
    fn test_missing_stripe_key_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        let result = AppConfig::load();
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_ttl_fails_validation() {
        let config = load_with(&[("CINEMA_STORE__PAYMENT__SESSION_TTL_MINUTES", "10")]).unwrap();

        assert_eq!(config.validate(), Err(ValidationError::InvalidSessionTtl));
    }
}
