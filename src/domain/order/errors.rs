//! Order-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | EmptyCart | 400 |
//! | NoEligibleMovie | 422 |
//! | InvalidTransition | 422 |
//! | NotFoundOrUnauthorized | 404 |
//! | CheckoutConflict | 409 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, InvalidTransition, OrderId};

use super::{ExcludedLine, OrderStatus};

/// Order-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// No cart, or a cart without lines.
    EmptyCart,

    /// Every cart line was excluded.
    NoEligibleMovie { excluded: Vec<ExcludedLine> },

    /// Order does not exist or belongs to someone else.
    NotFoundOrUnauthorized(OrderId),

    /// Status change not allowed from the current status.
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The cart changed underneath a checkout.
    CheckoutConflict,

    /// Infrastructure error.
    Infrastructure(String),
}

impl OrderError {
    pub fn empty_cart() -> Self {
        OrderError::EmptyCart
    }

    pub fn no_eligible_movie(excluded: Vec<ExcludedLine>) -> Self {
        OrderError::NoEligibleMovie { excluded }
    }

    pub fn not_found_or_unauthorized(order_id: OrderId) -> Self {
        OrderError::NotFoundOrUnauthorized(order_id)
    }

    pub fn invalid_transition(from: OrderStatus, to: OrderStatus) -> Self {
        OrderError::InvalidTransition { from, to }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        OrderError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::EmptyCart => ErrorCode::EmptyCart,
            OrderError::NoEligibleMovie { .. } => ErrorCode::NoEligibleMovie,
            OrderError::NotFoundOrUnauthorized(_) => ErrorCode::OrderNotFound,
            OrderError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            OrderError::CheckoutConflict => ErrorCode::CheckoutConflict,
            OrderError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            OrderError::EmptyCart => "Cart is empty".to_string(),
            OrderError::NoEligibleMovie { excluded } => {
                let reasons: Vec<String> = excluded
                    .iter()
                    .map(|e| format!("movie {} {}", e.movie_id, e.reason.describe()))
                    .collect();
                format!("No movie in the cart can be ordered: {}", reasons.join(", "))
            }
            OrderError::NotFoundOrUnauthorized(id) => format!("Order {} not found", id),
            OrderError::InvalidTransition { from, to } => {
                format!("Cannot move order from {} to {}", from, to)
            }
            OrderError::CheckoutConflict => {
                "Cart changed during checkout; please try again".to_string()
            }
            OrderError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::Infrastructure(_) | OrderError::CheckoutConflict
        )
    }
}

impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for OrderError {}

impl From<InvalidTransition<OrderStatus>> for OrderError {
    fn from(err: InvalidTransition<OrderStatus>) -> Self {
        OrderError::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::CheckoutConflict => OrderError::CheckoutConflict,
            _ => OrderError::Infrastructure(err.to_string()),
        }
    }
}

impl From<OrderError> for DomainError {
    fn from(err: OrderError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
