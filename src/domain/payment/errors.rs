//! Payment-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | OrderNotFoundOrUnauthorized | 404 |
//! | NotFound | 404 |
//! | OrderNotPayable | 422 |
//! | NotRefundable | 422 |
//! | InvalidTransition | 422 |
//! | PriceDrift | 422 |
//! | AmountMismatch | 422 |
//! | AlreadyInProgress | 409 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, Money, OrderId, PaymentId};

use super::{PaymentStatus, PriceDrift};

/// Payment-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Order does not exist or belongs to someone else.
    OrderNotFoundOrUnauthorized(OrderId),

    /// Payment does not exist or belongs to someone else.
    NotFound(PaymentId),

    /// The order cannot be paid in its current status.
    OrderNotPayable { order_id: OrderId, reason: String },

    /// Another attempt for the same order is still pending.
    AlreadyInProgress,

    /// Only successful payments can be refunded.
    NotRefundable {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    /// Status change not allowed from the current status.
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Catalog prices moved since checkout and the policy refuses to charge.
    PriceDrift { drifts: Vec<PriceDrift> },

    /// The stored order total disagrees with its lines.
    AmountMismatch { stored: Money, computed: Money },

    /// The payment processor failed or refused the request.
    Gateway { message: String, retryable: bool },

    /// Infrastructure error.
    Infrastructure(String),
}

impl PaymentError {
    pub fn order_not_found_or_unauthorized(order_id: OrderId) -> Self {
        PaymentError::OrderNotFoundOrUnauthorized(order_id)
    }

    pub fn not_found(payment_id: PaymentId) -> Self {
        PaymentError::NotFound(payment_id)
    }

    pub fn order_not_payable(order_id: OrderId, reason: impl Into<String>) -> Self {
        PaymentError::OrderNotPayable {
            order_id,
            reason: reason.into(),
        }
    }

    pub fn already_in_progress() -> Self {
        PaymentError::AlreadyInProgress
    }

    pub fn not_refundable(payment_id: PaymentId, status: PaymentStatus) -> Self {
        PaymentError::NotRefundable { payment_id, status }
    }

    pub fn invalid_transition(from: PaymentStatus, to: PaymentStatus) -> Self {
        PaymentError::InvalidTransition { from, to }
    }

    pub fn price_drift(drifts: Vec<PriceDrift>) -> Self {
        PaymentError::PriceDrift { drifts }
    }

    pub fn amount_mismatch(stored: Money, computed: Money) -> Self {
        PaymentError::AmountMismatch { stored, computed }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        PaymentError::Gateway {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn gateway_rejected(message: impl Into<String>) -> Self {
        PaymentError::Gateway {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::OrderNotFoundOrUnauthorized(_) => ErrorCode::OrderNotFound,
            PaymentError::NotFound(_) => ErrorCode::PaymentNotFound,
            PaymentError::OrderNotPayable { .. } => ErrorCode::OrderNotPayable,
            PaymentError::AlreadyInProgress => ErrorCode::PaymentAlreadyInProgress,
            PaymentError::NotRefundable { .. } => ErrorCode::NotRefundable,
            PaymentError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            PaymentError::PriceDrift { .. } => ErrorCode::PriceDrift,
            PaymentError::AmountMismatch { .. } => ErrorCode::AmountMismatch,
            PaymentError::Gateway { .. } => ErrorCode::PaymentGatewayError,
            PaymentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            PaymentError::OrderNotFoundOrUnauthorized(id) => format!("Order {} not found", id),
            PaymentError::NotFound(id) => format!("Payment {} not found", id),
            PaymentError::OrderNotPayable { reason, .. } => reason.clone(),
            PaymentError::AlreadyInProgress => {
                "A payment for this order is already in progress".to_string()
            }
            PaymentError::NotRefundable { status, .. } => {
                format!("Only successful payments can be refunded (status: {})", status)
            }
            PaymentError::InvalidTransition { from, to } => {
                format!("Cannot move payment from {} to {}", from, to)
            }
            PaymentError::PriceDrift { drifts } => {
                let movies: Vec<String> = drifts
                    .iter()
                    .map(|d| {
                        format!("movie {} ({} -> {})", d.movie_id, d.order_price, d.current_price)
                    })
                    .collect();
                format!("Prices changed since checkout: {}", movies.join(", "))
            }
            PaymentError::AmountMismatch { stored, computed } => format!(
                "Order total {} does not match the sum of its lines {}",
                stored, computed
            ),
            PaymentError::Gateway { message, .. } => {
                format!("Payment provider error: {}", message)
            }
            PaymentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::Gateway { retryable, .. } => *retryable,
            PaymentError::Infrastructure(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PaymentAlreadyInProgress => PaymentError::AlreadyInProgress,
            ErrorCode::PaymentGatewayError => PaymentError::gateway(err.message),
            _ => PaymentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
