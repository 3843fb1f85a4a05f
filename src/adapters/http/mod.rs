//! HTTP adapters - REST API implementations.
//!
//! Each area (cart, orders, payments) has its own DTOs, handlers and routes.
//! Identity is asserted upstream and arrives in `X-User-Id` / `X-User-Role`.

pub mod cart;
pub mod error;
pub mod middleware;
pub mod order;
pub mod params;
pub mod payment;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

use std::time::Duration;

use axum::http::HeaderName;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};
pub use middleware::{AdminUser, CurrentUser, USER_ID_HEADER, USER_ROLE_HEADER};
pub use state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the complete API router.
///
/// # Routes
/// - `/health`
/// - `/api/cart/...`, `/api/orders/...`, `/api/payments/...`
/// - `/api/webhooks/stripe`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/cart", cart::cart_routes())
        .nest("/api/orders", order::order_routes())
        .nest("/api/payments", payment::payment_routes())
        .nest("/api/webhooks", payment::webhook_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Outer layers applied by the server binary: request ids, timeout,
/// compression and CORS.
pub fn with_server_layers(router: Router, request_timeout: Duration, cors: CorsLayer) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
