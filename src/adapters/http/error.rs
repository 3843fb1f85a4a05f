//! API error type that converts domain errors to HTTP responses.
//!
//! Every error renders as `{code, message, retryable}` plus optional details.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::cart::CartError;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::domain::order::OrderError;
use crate::domain::payment::{PaymentError, WebhookError};

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Whether repeating the same request may succeed.
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.into(),
                message: message.into(),
                retryable: false,
                details: None,
            },
        }
    }

    fn from_code(code: ErrorCode, message: String, retryable: bool) -> Self {
        let mut err = Self::new(status_for(code), code.to_string(), message);
        err.body.retryable = retryable;
        err
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.body.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::ValidationFailed, message.into(), false)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::Forbidden, message.into(), false)
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            "Authentication required",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }
}

/// HTTP status for each error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed | ErrorCode::EmptyCart => StatusCode::BAD_REQUEST,

        ErrorCode::NoEligibleMovie
        | ErrorCode::InvalidStateTransition
        | ErrorCode::OrderNotPayable
        | ErrorCode::NotRefundable
        | ErrorCode::PriceDrift
        | ErrorCode::AmountMismatch => StatusCode::UNPROCESSABLE_ENTITY,

        ErrorCode::MovieAlreadyInCart
        | ErrorCode::MovieAlreadyPurchased
        | ErrorCode::PaymentAlreadyInProgress
        | ErrorCode::CheckoutConflict => StatusCode::CONFLICT,

        ErrorCode::MovieNotFound
        | ErrorCode::MovieNotInCart
        | ErrorCode::CartNotFound
        | ErrorCode::OrderNotFound
        | ErrorCode::PaymentNotFound => StatusCode::NOT_FOUND,

        ErrorCode::Forbidden => StatusCode::FORBIDDEN,

        ErrorCode::PaymentGatewayError => StatusCode::BAD_GATEWAY,

        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        Self::from_code(err.code(), err.message(), err.is_retryable())
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let api = Self::from_code(err.code(), err.message(), err.is_retryable());
        match &err {
            OrderError::NoEligibleMovie { excluded } => {
                api.with_details(serde_json::json!({ "excluded": excluded }))
            }
            _ => api,
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let api = Self::from_code(err.code(), err.message(), err.is_retryable());
        match &err {
            PaymentError::PriceDrift { drifts } => {
                api.with_details(serde_json::json!({ "drifts": drifts }))
            }
            _ => api,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let retryable = matches!(err.code, ErrorCode::DatabaseError);
        Self::from_code(err.code, err.message, retryable)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        let code = match &err {
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => {
                "INVALID_TIMESTAMP"
            }
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => "INVALID_PAYLOAD",
            WebhookError::UnsupportedEvent(_) | WebhookError::Ignored(_) => "IGNORED",
            WebhookError::Database(_) => "DATABASE_ERROR",
        };
        let mut api = Self::new(err.status_code(), code, err.to_string());
        api.body.retryable = err.is_retryable();
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = %self.body.code, message = %self.body.message, "Request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MovieId, OrderId};
    use crate::domain::order::{ExcludedLine, ExclusionReason, OrderStatus};

    #[test]
    fn cart_conflicts_are_409() {
        let err = ApiError::from(CartError::already_in_cart(MovieId::new(7).unwrap()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.body().code, "MOVIE_ALREADY_IN_CART");
        assert!(!err.body().retryable);
    }

    #[test]
    fn empty_cart_is_400() {
        assert_eq!(
            ApiError::from(OrderError::empty_cart()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_transition_is_422() {
        let err = ApiError::from(OrderError::invalid_transition(
            OrderStatus::Paid,
            OrderStatus::Canceled,
        ));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.body().code, "INVALID_STATE_TRANSITION");
    }

    #[test]
    fn no_eligible_movie_lists_exclusions() {
        let err = ApiError::from(OrderError::no_eligible_movie(vec![ExcludedLine {
            movie_id: MovieId::new(7).unwrap(),
            reason: ExclusionReason::AlreadyPurchased,
        }]));
        let details = err.body().details.clone().unwrap();
        assert_eq!(details["excluded"][0]["reason"], "already_purchased");
    }

    #[test]
    fn unauthorized_order_looks_missing() {
        let err = ApiError::from(PaymentError::order_not_found_or_unauthorized(OrderId::new()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn gateway_failure_is_retryable_502() {
        let err = ApiError::from(PaymentError::gateway("timeout"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.body().retryable);
    }

    #[test]
    fn in_progress_is_409() {
        let err = ApiError::from(PaymentError::already_in_progress());
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn webhook_errors_keep_their_status() {
        assert_eq!(
            ApiError::from(WebhookError::InvalidSignature).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(WebhookError::MissingField("id")).status(),
            StatusCode::BAD_REQUEST
        );
        let storage = ApiError::from(WebhookError::Database("down".into()));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(storage.body().retryable);
    }
}
