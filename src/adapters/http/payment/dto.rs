//! HTTP DTOs for payment endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::payment::HandlePaymentWebhookResult;
use crate::domain::foundation::Money;
use crate::domain::payment::{Payment, PaymentLine};
use crate::ports::{PaymentPage, RefundStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLineResponse {
    pub id: String,
    pub order_line_id: String,
    pub price_at_payment: Money,
}

impl From<&PaymentLine> for PaymentLineResponse {
    fn from(line: &PaymentLine) -> Self {
        Self {
            id: line.id.to_string(),
            order_line_id: line.order_line_id.to_string(),
            price_at_payment: line.price_at_payment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub user_id: String,
    pub order_id: String,
    pub status: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_payment_id: Option<String>,
    pub lines: Vec<PaymentLineResponse>,
    pub created_at: String,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            user_id: payment.user_id.to_string(),
            order_id: payment.order_id.to_string(),
            status: payment.status.as_str().to_string(),
            amount: payment.amount,
            external_session_id: payment.external_session_id.clone(),
            external_payment_id: payment.external_payment_id.clone(),
            lines: payment.lines.iter().map(PaymentLineResponse::from).collect(),
            created_at: payment.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPageResponse {
    pub items: Vec<PaymentResponse>,
    pub total: u64,
    pub skip: u32,
    pub limit: u32,
}

impl PaymentPageResponse {
    pub fn new(page: &PaymentPage, skip: u32, limit: u32) -> Self {
        Self {
            items: page.items.iter().map(PaymentResponse::from).collect(),
            total: page.total,
            skip,
            limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResponse {
    pub payment: PaymentResponse,
    pub refund_id: String,
    pub refund_status: RefundStatus,
}

/// Body of every acknowledged webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub outcome: String,
}

impl From<&HandlePaymentWebhookResult> for WebhookAckResponse {
    fn from(result: &HandlePaymentWebhookResult) -> Self {
        let outcome = match result {
            HandlePaymentWebhookResult::Applied { .. } => "applied",
            HandlePaymentWebhookResult::AlreadyApplied { .. } => "already_applied",
            HandlePaymentWebhookResult::Duplicate => "duplicate",
            HandlePaymentWebhookResult::Stale { .. } => "stale",
            HandlePaymentWebhookResult::PaymentNotFound { .. } => "payment_not_found",
            HandlePaymentWebhookResult::Ignored { .. } => "ignored",
        };
        Self {
            received: true,
            outcome: outcome.to_string(),
        }
    }
}
