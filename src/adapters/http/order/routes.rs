//! Axum router configuration for order endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::state::AppState;
use super::handlers::{
    cancel_order, create_order, get_order, list_all_orders, list_orders, pay_order,
};

/// Create the order API router, mounted at `/api/orders`.
///
/// # Routes
/// - `POST /` - Checkout the cart
/// - `GET /` - Caller's orders
/// - `GET /admin` - All orders with filters (admin)
/// - `GET /:id` - One order (owner or admin)
/// - `POST /:id/cancel` - Cancel a pending order
/// - `POST /:id/pay` - Start a Stripe checkout for the order
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/admin", get(list_all_orders))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/pay", post(pay_order))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    use crate::adapters::http::test_support::TestApp;

    async fn app_with_cart() -> TestApp {
        let app = TestApp::new()
            .with_movie(7, "Metropolis", dec!(12.99))
            .await
            .with_movie(8, "Nosferatu", dec!(9.99))
            .await;
        for movie in [7, 8] {
            app.customer("POST", "/api/cart/items", Some(json!({"movie_id": movie})))
                .await;
        }
        app
    }

    async fn checkout(app: &TestApp) -> Value {
        let (status, body) = app.customer("POST", "/api/orders", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn checkout_creates_pending_order_and_empties_cart() {
        let app = app_with_cart().await;

        let body = checkout(&app).await;

        assert_eq!(body["order"]["status"], "pending");
        assert_eq!(body["order"]["total_amount"], "22.98");
        assert_eq!(body["excluded"], json!([]));

        let (_, cart) = app.customer("GET", "/api/cart", None).await;
        assert_eq!(cart["lines"], json!([]));
    }

    #[tokio::test]
    async fn empty_cart_checkout_is_bad_request() {
        let app = TestApp::new();

        let (status, body) = app.customer("POST", "/api/orders", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_CART");
    }

    #[tokio::test]
    async fn orders_are_invisible_to_other_users() {
        let app = app_with_cart().await;
        let body = checkout(&app).await;
        let uri = format!("/api/orders/{}", body["order"]["id"].as_str().unwrap());

        let (status, _) = app.customer("GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send("GET", &uri, Some(("user-2", "customer")), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.admin("GET", &uri).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn cancel_pending_order_then_cancel_again_is_rejected() {
        let app = app_with_cart().await;
        let body = checkout(&app).await;
        let uri = format!("/api/orders/{}/cancel", body["order"]["id"].as_str().unwrap());

        let (status, body) = app.customer("POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "canceled");

        let (status, body) = app.customer("POST", &uri, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_STATE_TRANSITION");
    }

    #[tokio::test]
    async fn pay_returns_checkout_url() {
        let app = app_with_cart().await;
        let body = checkout(&app).await;
        let uri = format!("/api/orders/{}/pay", body["order"]["id"].as_str().unwrap());

        let (status, body) = app.customer("POST", &uri, None).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["amount"], "22.98");
        assert!(body["checkout_url"]
            .as_str()
            .unwrap()
            .starts_with("https://checkout.mock/pay/"));
    }

    #[tokio::test]
    async fn second_pay_while_first_is_pending_conflicts() {
        let app = app_with_cart().await;
        let body = checkout(&app).await;
        let uri = format!("/api/orders/{}/pay", body["order"]["id"].as_str().unwrap());
        app.customer("POST", &uri, None).await;

        let (status, body) = app.customer("POST", &uri, None).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PAYMENT_ALREADY_IN_PROGRESS");
    }

    #[tokio::test]
    async fn admin_listing_filters_by_status() {
        let app = app_with_cart().await;
        checkout(&app).await;

        let (status, body) = app.admin("GET", "/api/orders/admin?status=pending").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orders"].as_array().unwrap().len(), 1);

        let (_, body) = app.admin("GET", "/api/orders/admin?status=paid").await;
        assert!(body["orders"].as_array().unwrap().is_empty());

        let (status, _) = app.admin("GET", "/api/orders/admin?status=shipped").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_listing_is_forbidden_to_customers() {
        let app = TestApp::new();

        let (status, _) = app.customer("GET", "/api/orders/admin", None).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
