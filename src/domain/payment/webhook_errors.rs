//! Webhook error types for Stripe webhook handling.
//!
//! The HTTP status of each error is what the processor sees, so it encodes the
//! retry contract: 2xx means "do not send again", 5xx means "try later".

use http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Event kind this service does not consume.
    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the processor should deliver this event again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// True for outcomes acknowledged with 2xx.
    pub fn is_acknowledged(&self) -> bool {
        self.status_code().is_success()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp => StatusCode::UNAUTHORIZED,

            WebhookError::ParseError(_) | WebhookError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }

            WebhookError::UnsupportedEvent(_) | WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn signature_failures_return_unauthorized() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::InvalidTimestamp.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn malformed_payload_returns_bad_request() {
        assert_eq!(
            WebhookError::ParseError("bad json".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MissingField("payment_intent").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unsupported_and_ignored_events_are_acknowledged() {
        assert!(WebhookError::UnsupportedEvent("customer.created".into()).is_acknowledged());
        assert!(WebhookError::Ignored("payment not found".into()).is_acknowledged());
    }

    #[test]
    fn database_error_asks_for_retry() {
        let err = WebhookError::Database("connection lost".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
        assert!(!err.is_acknowledged());
    }

    // ══════════════════════════════════════════════════════════════
    // Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn unsupported_event_displays_type() {
        let err = WebhookError::UnsupportedEvent("invoice.paid".into());
        assert_eq!(err.to_string(), "Unsupported event type: invoice.paid");
    }

    #[test]
    fn missing_field_displays_field_name() {
        assert_eq!(
            WebhookError::MissingField("id").to_string(),
            "Missing field: id"
        );
    }
}
