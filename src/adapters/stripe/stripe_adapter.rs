//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over the Stripe REST API:
//! hosted Checkout Sessions for one-off movie purchases and full refunds of
//! the underlying payment intent.
//!
//! Every call is bounded by the configured timeout and carries an
//! `Idempotency-Key`, so a retried request never creates a second session or
//! refund.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_timeout_secs(10);
//! let gateway = StripeGateway::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::ports::{
    CheckoutSession, CreateCheckoutSessionRequest, GatewayError, GatewayErrorCode,
    PaymentGateway, RefundReceipt, RefundRequest,
};

use super::api_types::{StripeCheckoutSession, StripeErrorEnvelope, StripeRefund};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Upper bound for a single API call.
    timeout_secs: u64,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Stripe payment gateway.
pub struct StripeGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Sends a request under the configured timeout and decodes the body.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, GatewayError> {
        let request = request.basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None);

        let response = tokio::time::timeout(self.config.timeout(), request.send())
            .await
            .map_err(|_| {
                tracing::error!(operation, "Stripe call timed out");
                GatewayError::timeout(self.config.timeout_secs)
            })?
            .map_err(|e| {
                tracing::error!(operation, error = %e, "Stripe call failed");
                if e.is_timeout() {
                    GatewayError::timeout(self.config.timeout_secs)
                } else {
                    GatewayError::network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            let error = map_error_response(status, &body);
            tracing::error!(
                operation,
                status,
                code = %error.code,
                provider_code = ?error.provider_code,
                "Stripe API error"
            );
            return Err(error);
        }

        let decoded = response.json::<T>().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;
        Ok(Some(decoded))
    }
}

/// Form parameters for `POST /v1/checkout/sessions`.
pub(crate) fn checkout_session_params(
    request: &CreateCheckoutSessionRequest,
) -> Result<Vec<(String, String)>, GatewayError> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("client_reference_id".to_string(), request.order_id.to_string()),
        ("expires_at".to_string(), request.expires_at.as_unix_secs().to_string()),
        ("metadata[order_id]".to_string(), request.order_id.to_string()),
        ("metadata[payment_id]".to_string(), request.payment_id.to_string()),
        ("metadata[user_id]".to_string(), request.user_id.to_string()),
        (
            "payment_intent_data[metadata][order_id]".to_string(),
            request.order_id.to_string(),
        ),
        (
            "payment_intent_data[metadata][payment_id]".to_string(),
            request.payment_id.to_string(),
        ),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let unit_amount = item
            .unit_amount
            .to_minor_units()
            .map_err(|e| GatewayError::invalid_request(e.to_string()))?;
        let prefix = format!("line_items[{}]", i);
        params.push((
            format!("{}[price_data][currency]", prefix),
            request.currency.clone(),
        ));
        params.push((
            format!("{}[price_data][product_data][name]", prefix),
            item.name.clone(),
        ));
        params.push((
            format!("{}[price_data][unit_amount]", prefix),
            unit_amount.to_string(),
        ));
        params.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }

    Ok(params)
}

/// Maps a non-2xx Stripe response to a gateway error.
pub(crate) fn map_error_response(status: u16, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<StripeErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("Stripe returned HTTP {}", status));

    let code = match status {
        401 | 403 => GatewayErrorCode::AuthenticationError,
        429 => GatewayErrorCode::RateLimitExceeded,
        400 | 402 | 409 => GatewayErrorCode::InvalidRequest,
        500..=599 => GatewayErrorCode::ProviderError,
        _ => GatewayErrorCode::Unknown,
    };

    let error = GatewayError::new(code, message);
    match parsed.and_then(|e| e.error.code) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let params = checkout_session_params(&request)?;

        let session: StripeCheckoutSession = self
            .execute(
                "create_checkout_session",
                self.http_client
                    .post(self.url("/v1/checkout/sessions"))
                    .header("Idempotency-Key", &request.idempotency_key)
                    .form(&params),
            )
            .await?
            .ok_or_else(|| GatewayError::provider("Stripe returned 404 creating a session"))?;

        let url = session
            .url
            .ok_or_else(|| GatewayError::provider("Stripe session has no redirect URL"))?;

        tracing::info!(
            order_id = %request.order_id,
            payment_id = %request.payment_id,
            session_id = %session.id,
            "Stripe checkout session created"
        );

        Ok(CheckoutSession {
            id: session.id,
            url,
            payment_intent_id: session.payment_intent,
        })
    }

    async fn resolve_payment_intent(
        &self,
        session_id: &str,
    ) -> Result<Option<String>, GatewayError> {
        let session: Option<StripeCheckoutSession> = self
            .execute(
                "resolve_payment_intent",
                self.http_client
                    .get(self.url(&format!("/v1/checkout/sessions/{}", session_id))),
            )
            .await?;

        Ok(session.and_then(|s| s.payment_intent))
    }

    async fn create_refund(&self, request: RefundRequest) -> Result<RefundReceipt, GatewayError> {
        let refund: StripeRefund = self
            .execute(
                "create_refund",
                self.http_client
                    .post(self.url("/v1/refunds"))
                    .header("Idempotency-Key", &request.idempotency_key)
                    .form(&[("payment_intent", request.payment_intent_id.as_str())]),
            )
            .await?
            .ok_or_else(|| {
                GatewayError::invalid_request(format!(
                    "Payment intent {} not found",
                    request.payment_intent_id
                ))
            })?;

        tracing::info!(
            payment_intent_id = %request.payment_intent_id,
            refund_id = %refund.id,
            status = ?refund.status,
            "Stripe refund requested"
        );

        Ok(RefundReceipt {
            id: refund.id,
            status: refund.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, OrderId, PaymentId, Timestamp, UserId};
    use crate::ports::CheckoutLineItem;
    use rust_decimal_macros::dec;

    fn request() -> CreateCheckoutSessionRequest {
        CreateCheckoutSessionRequest {
            order_id: OrderId::new(),
            payment_id: PaymentId::new(),
            user_id: UserId::new("user-1").unwrap(),
            line_items: vec![CheckoutLineItem {
                name: "Metropolis".to_string(),
                unit_amount: Money::from_decimal(dec!(12.99)).unwrap(),
                quantity: 1,
            }],
            currency: "usd".to_string(),
            success_url: "https://cinema.test/ok?session_id={CHECKOUT_SESSION_ID}".to_string(),
            cancel_url: "https://cinema.test/cancel".to_string(),
            expires_at: Timestamp::from_unix_secs(1_700_001_800).unwrap(),
            idempotency_key: "checkout-1".to_string(),
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn config_defaults() {
        let config = StripeConfig::new(SecretString::new("sk_test_x".to_string()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn config_debug_redacts_key() {
        let config = StripeConfig::new(SecretString::new("sk_test_secret".to_string()));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk_test_secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = StripeConfig::new(SecretString::new("sk_test_x".to_string()))
            .with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    #[test]
    fn session_params_carry_amount_in_minor_units() {
        let params = checkout_session_params(&request()).unwrap();

        assert_eq!(param(&params, "line_items[0][price_data][unit_amount]"), Some("1299"));
        assert_eq!(param(&params, "line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(param(&params, "line_items[0][quantity]"), Some("1"));
        assert_eq!(param(&params, "mode"), Some("payment"));
    }

    #[test]
    fn session_params_carry_metadata_and_expiry() {
        let req = request();
        let params = checkout_session_params(&req).unwrap();

        assert_eq!(
            param(&params, "metadata[order_id]"),
            Some(req.order_id.to_string().as_str())
        );
        assert_eq!(
            param(&params, "metadata[payment_id]"),
            Some(req.payment_id.to_string().as_str())
        );
        assert_eq!(param(&params, "expires_at"), Some("1700001800"));
    }

    #[test]
    fn error_mapping_uses_status_and_provider_code() {
        let body = r#"{"error": {"type": "invalid_request_error", "code": "amount_too_small", "message": "Amount must be at least 50 cents"}}"#;

        let error = map_error_response(400, body);

        assert_eq!(error.code, GatewayErrorCode::InvalidRequest);
        assert_eq!(error.provider_code.as_deref(), Some("amount_too_small"));
        assert_eq!(error.message, "Amount must be at least 50 cents");
        assert!(!error.retryable);
    }

    #[test]
    fn server_errors_are_retryable() {
        let error = map_error_response(503, "upstream unavailable");

        assert_eq!(error.code, GatewayErrorCode::ProviderError);
        assert!(error.retryable);
        assert!(error.message.contains("503"));
    }

    #[test]
    fn rate_limit_and_auth_errors() {
        assert_eq!(
            map_error_response(429, "").code,
            GatewayErrorCode::RateLimitExceeded
        );
        assert_eq!(
            map_error_response(401, "").code,
            GatewayErrorCode::AuthenticationError
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_retryable_network_error() {
        let gateway = StripeGateway::new(
            StripeConfig::new(SecretString::new("sk_test_x".to_string()))
                .with_base_url("http://127.0.0.1:1")
                .with_timeout_secs(2),
        );

        let err = gateway.resolve_payment_intent("cs_1").await.unwrap_err();

        assert!(err.retryable);
    }
}
