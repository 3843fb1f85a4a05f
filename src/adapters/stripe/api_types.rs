//! Stripe REST API response types.
//!
//! Only the fields this service reads are modelled; Stripe adds fields
//! freely, so every struct ignores unknown keys.

use serde::{Deserialize, Serialize};

use crate::ports::RefundStatus;

// ════════════════════════════════════════════════════════════════════════════════
// Checkout Sessions
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Checkout Session object (`cs_...`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    pub id: String,

    /// Hosted payment page; absent once the session is complete or expired.
    pub url: Option<String>,

    /// Payment intent backing the session. Newer API versions only create it
    /// when the customer submits the form.
    pub payment_intent: Option<String>,

    /// `paid`, `unpaid` or `no_payment_required`.
    #[serde(default)]
    pub payment_status: Option<String>,

    /// `open`, `complete` or `expired`.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Refunds
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Refund object (`re_...`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeRefund {
    pub id: String,
    pub status: RefundStatus,
    pub payment_intent: Option<String>,
    /// Amount in minor units.
    #[serde(default)]
    pub amount: i64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    /// `api_error`, `card_error`, `idempotency_error`, `invalid_request_error`.
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_open_session() {
        let json = r#"{
            "id": "cs_test_a1",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_a1",
            "payment_intent": null,
            "payment_status": "unpaid",
            "status": "open",
            "metadata": {"order_id": "o-1", "payment_id": "p-1"},
            "mode": "payment"
        }"#;

        let session: StripeCheckoutSession = serde_json::from_str(json).unwrap();

        assert_eq!(session.id, "cs_test_a1");
        assert!(session.url.is_some());
        assert!(session.payment_intent.is_none());
        assert_eq!(session.metadata.get("payment_id").map(String::as_str), Some("p-1"));
    }

    #[test]
    fn parse_refund_with_unknown_status() {
        let json = r#"{"id": "re_1", "status": "something_new", "payment_intent": "pi_1", "amount": 1299}"#;

        let refund: StripeRefund = serde_json::from_str(json).unwrap();

        assert_eq!(refund.status, RefundStatus::Unknown);
        assert_eq!(refund.amount, 1299);
    }

    #[test]
    fn parse_error_envelope() {
        let json = r#"{"error": {"type": "invalid_request_error", "code": "resource_missing", "message": "No such checkout.session"}}"#;

        let envelope: StripeErrorEnvelope = serde_json::from_str(json).unwrap();

        assert_eq!(envelope.error.error_type, "invalid_request_error");
        assert_eq!(envelope.error.code.as_deref(), Some("resource_missing"));
    }
}
