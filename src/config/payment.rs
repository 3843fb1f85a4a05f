//! Payment configuration (Stripe checkout and refunds)

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use crate::adapters::stripe::StripeConfig;
use crate::application::handlers::payment::{
    CheckoutSettings, RefundSettings, SESSION_ID_PLACEHOLDER,
};
use crate::domain::payment::PriceDriftPolicy;

use super::error::ValidationError;

const DEFAULT_STRIPE_API_BASE_URL: &str = "https://api.stripe.com";

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key (`sk_test_...` / `sk_live_...`)
    pub stripe_api_key: String,

    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: String,

    #[serde(default = "default_api_base_url")]
    pub stripe_api_base_url: String,

    /// ISO 4217 currency code sent with every checkout session
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Base URL the user returns to after checkout
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    #[serde(default = "default_success_path")]
    pub success_path: String,

    #[serde(default = "default_cancel_path")]
    pub cancel_path: String,

    /// Minutes until an unpaid checkout session expires
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,

    /// Upper bound for one Stripe call, in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,

    #[serde(default)]
    pub price_drift_policy: PriceDriftPolicy,

    /// Mark payments refunded as soon as Stripe accepts the refund
    #[serde(default)]
    pub mark_refunded_on_accept: bool,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig::new(SecretString::new(self.stripe_api_key.clone()))
            .with_base_url(&self.stripe_api_base_url)
            .with_timeout_secs(self.gateway_timeout_secs)
    }

    pub fn webhook_secret(&self) -> SecretString {
        SecretString::new(self.stripe_webhook_secret.clone())
    }

    /// `frontend_url + path` with the session id placeholder appended.
    fn return_url(&self, path: &str) -> String {
        format!(
            "{}/{}?session_id={}",
            self.frontend_url.trim_end_matches('/'),
            path.trim_start_matches('/'),
            SESSION_ID_PLACEHOLDER
        )
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            currency: self.currency.to_ascii_lowercase(),
            success_url: self.return_url(&self.success_path),
            cancel_url: self.return_url(&self.cancel_path),
            session_ttl_minutes: self.session_ttl_minutes,
            gateway_timeout: self.gateway_timeout(),
            price_drift_policy: self.price_drift_policy,
        }
    }

    pub fn refund_settings(&self) -> RefundSettings {
        RefundSettings {
            gateway_timeout: self.gateway_timeout(),
            mark_refunded_on_accept: self.mark_refunded_on_accept,
        }
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__STRIPE_WEBHOOK_SECRET",
            ));
        }
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        if !self.frontend_url.starts_with("http://") && !self.frontend_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidFrontendUrl);
        }
        if !(30..=1440).contains(&self.session_ttl_minutes) {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if !(1..=60).contains(&self.gateway_timeout_secs) {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_api_base_url: default_api_base_url(),
            currency: default_currency(),
            frontend_url: default_frontend_url(),
            success_path: default_success_path(),
            cancel_path: default_cancel_path(),
            session_ttl_minutes: default_session_ttl(),
            gateway_timeout_secs: default_gateway_timeout(),
            price_drift_policy: PriceDriftPolicy::default(),
            mark_refunded_on_accept: false,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_STRIPE_API_BASE_URL.to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_success_path() -> String {
    "/payment/success".to_string()
}

fn default_cancel_path() -> String {
    "/payment/cancel".to_string()
}

fn default_session_ttl() -> i64 {
    30
}

fn default_gateway_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: "sk_test_abcd1234".to_string(),
            stripe_webhook_secret: "whsec_xyz789".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
        assert!(valid().is_test_mode());
    }

    #[test]
    fn test_missing_secrets() {
        assert_eq!(
            PaymentConfig::default().validate(),
            Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"))
        );
        let config = PaymentConfig {
            stripe_webhook_secret: String::new(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_prefixes() {
        let config = PaymentConfig {
            stripe_api_key: "pk_test_xxx".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));

        let config = PaymentConfig {
            stripe_webhook_secret: "secret_xxx".to_string(),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn test_session_ttl_bounds() {
        for ttl in [29, 1441] {
            let config = PaymentConfig {
                session_ttl_minutes: ttl,
                ..valid()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidSessionTtl));
        }
        let config = PaymentConfig {
            session_ttl_minutes: 1440,
            ..valid()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_currency_must_be_iso_code() {
        let config = PaymentConfig {
            currency: "dollars".to_string(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_checkout_settings_embed_placeholder() {
        let config = PaymentConfig {
            frontend_url: "https://cinema.example/".to_string(),
            currency: "EUR".to_string(),
            ..valid()
        };
        let settings = config.checkout_settings();

        assert_eq!(settings.currency, "eur");
        assert_eq!(
            settings.success_url,
            "https://cinema.example/payment/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert!(settings.cancel_url.ends_with("/payment/cancel?session_id={CHECKOUT_SESSION_ID}"));
        assert_eq!(settings.gateway_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_refund_settings() {
        let config = PaymentConfig {
            mark_refunded_on_accept: true,
            gateway_timeout_secs: 5,
            ..valid()
        };
        let settings = config.refund_settings();
        assert!(settings.mark_refunded_on_accept);
        assert_eq!(settings.gateway_timeout, Duration::from_secs(5));
    }
}
