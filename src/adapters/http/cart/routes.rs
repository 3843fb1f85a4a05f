//! Axum router configuration for cart endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use super::super::state::AppState;
use super::handlers::{add_movie, clear_cart, get_cart, get_user_cart, remove_movie};

/// Create the cart API router, mounted at `/api/cart`.
///
/// # Routes
/// - `GET /` - Current cart with catalog names and prices
/// - `DELETE /` - Empty the cart
/// - `POST /items` - Add a movie
/// - `DELETE /items/:movie_id` - Remove a movie
/// - `GET /admin/users/:user_id` - Any user's cart (admin)
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_movie))
        .route("/items/:movie_id", delete(remove_movie))
        .route("/admin/users/:user_id", get(get_user_cart))
}
