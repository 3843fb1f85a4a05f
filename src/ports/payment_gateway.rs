//! Payment gateway port.
//!
//! The hosted checkout of a single payment processor: create a session for
//! an order, refund a collected payment. The client is injected into the
//! handlers that need it; nothing holds it globally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, OrderId, PaymentId, Timestamp, UserId};
use crate::domain::payment::PaymentError;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Looks up the payment intent behind a checkout session.
    async fn resolve_payment_intent(&self, session_id: &str)
        -> Result<Option<String>, GatewayError>;

    /// Requests a full refund of a payment intent.
    async fn create_refund(&self, request: RefundRequest) -> Result<RefundReceipt, GatewayError>;
}

/// One line of the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLineItem {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCheckoutSessionRequest {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub line_items: Vec<CheckoutLineItem>,
    /// ISO currency code, lowercase.
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub expires_at: Timestamp,
    /// Sent as the `Idempotency-Key` header.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Where the customer completes the payment.
    pub url: String,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub payment_intent_id: String,
    pub idempotency_key: String,
}

/// Processor-side refund status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Succeeded,
    Pending,
    RequiresAction,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub id: String,
    pub status: RefundStatus,
}

impl RefundReceipt {
    /// The processor took the refund on.
    pub fn accepted(&self) -> bool {
        matches!(self.status, RefundStatus::Succeeded | RefundStatus::Pending)
    }
}

/// Errors from gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Processor error code, when the processor sent one.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::new(
            GatewayErrorCode::Timeout,
            format!("payment provider did not answer within {}s", seconds),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        PaymentError::Gateway {
            message: err.message,
            retryable: err.retryable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    NetworkError,
    Timeout,
    AuthenticationError,
    InvalidRequest,
    RateLimitExceeded,
    ProviderError,
    Unknown,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::Timeout
                | GatewayErrorCode::RateLimitExceeded
                | GatewayErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::InvalidRequest => "invalid_request",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::ProviderError => "provider_error",
            GatewayErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn transient_codes_are_retryable() {
        assert!(GatewayErrorCode::NetworkError.is_retryable());
        assert!(GatewayErrorCode::Timeout.is_retryable());
        assert!(!GatewayErrorCode::InvalidRequest.is_retryable());
        assert!(!GatewayErrorCode::AuthenticationError.is_retryable());
    }

    #[test]
    fn gateway_error_display() {
        let err = GatewayError::timeout(10);
        assert_eq!(err.to_string(), "timeout: payment provider did not answer within 10s");
    }

    #[test]
    fn refund_acceptance_follows_status() {
        let receipt = |status| RefundReceipt {
            id: "re_1".into(),
            status,
        };
        assert!(receipt(RefundStatus::Succeeded).accepted());
        assert!(receipt(RefundStatus::Pending).accepted());
        assert!(!receipt(RefundStatus::Failed).accepted());
    }

    #[test]
    fn unknown_refund_status_deserializes() {
        let status: RefundStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(status, RefundStatus::Unknown);
    }

    #[test]
    fn converts_into_retryable_payment_error() {
        let err: PaymentError = GatewayError::network("connection refused").into();
        assert!(err.is_retryable());
    }
}
