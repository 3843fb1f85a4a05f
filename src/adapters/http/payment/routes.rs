//! Axum router configuration for payment endpoints and Stripe webhooks.

use axum::routing::{get, post};
use axum::Router;

use super::super::state::AppState;
use super::handlers::{
    get_payment, handle_stripe_webhook, list_all_payments, payment_history, payment_statistics,
    refund_payment,
};

/// Create the payment API router, mounted at `/api/payments`.
///
/// # Routes
/// - `GET /` - Caller's payment history (`skip`, `limit`)
/// - `GET /admin` - All payments with filters (admin)
/// - `GET /admin/statistics` - Totals and success rate (admin)
/// - `GET /:id` - One payment (owner or admin)
/// - `POST /:id/refund` - Full refund (admin)
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(payment_history))
        .route("/admin", get(list_all_payments))
        .route("/admin/statistics", get(payment_statistics))
        .route("/:id", get(get_payment))
        .route("/:id/refund", post(refund_payment))
}

/// Create the webhook router, mounted at `/api/webhooks`.
///
/// Separate from the payment routes because callers carry no user identity.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}
