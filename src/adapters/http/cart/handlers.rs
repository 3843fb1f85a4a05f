//! HTTP handlers for cart endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::cart::{
    AddMovieToCartCommand, ClearCartCommand, GetCartQuery, GetUserCartQuery,
    RemoveMovieFromCartCommand,
};
use crate::domain::cart::CartError;
use crate::domain::foundation::{DomainError, ErrorCode, MovieId, UserId};

use super::super::error::ApiError;
use super::super::middleware::{AdminUser, CurrentUser};
use super::super::state::AppState;
use super::dto::{AddMovieRequest, AddMovieResponse, CartResponse, ClearCartResponse};

fn parse_movie_id(raw: &str) -> Result<MovieId, ApiError> {
    raw.parse::<MovieId>().map_err(ApiError::from)
}

/// GET /api/cart - Current user's cart with catalog details.
pub async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .get_cart_handler()
        .handle(GetCartQuery {
            user_id: actor.user_id,
        })
        .await?;

    Ok(Json(CartResponse::from(result)))
}

/// POST /api/cart/items - Add a movie to the cart.
pub async fn add_movie(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<AddMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let movie_id = MovieId::new(request.movie_id)?;
    let result = state
        .add_movie_handler()
        .handle(AddMovieToCartCommand {
            user_id: actor.user_id,
            movie_id,
        })
        .await?;

    let response = AddMovieResponse {
        movie_id: result.line.movie_id.value(),
        added_at: result.line.added_at.as_datetime().to_rfc3339(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /api/cart/items/:movie_id - Remove one movie from the cart.
pub async fn remove_movie(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(movie_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let movie_id = parse_movie_id(&movie_id)?;
    let result = state
        .remove_movie_handler()
        .handle(RemoveMovieFromCartCommand {
            user_id: actor.user_id,
            movie_id,
        })
        .await?;

    if !result.removed {
        return Err(CartError::not_in_cart(movie_id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cart - Empty the cart.
pub async fn clear_cart(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .clear_cart_handler()
        .handle(ClearCartCommand {
            user_id: actor.user_id,
        })
        .await?;

    Ok(Json(ClearCartResponse {
        removed: result.removed,
    }))
}

/// GET /api/cart/admin/users/:user_id - Any user's cart (admin).
pub async fn get_user_cart(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(user_id)?;
    let result = state
        .get_user_cart_handler()
        .handle(GetUserCartQuery { user_id })
        .await?;

    match result.cart {
        Some(cart) => Ok(Json(CartResponse::from(&cart))),
        None => Err(DomainError::new(ErrorCode::CartNotFound, "User has no cart").into()),
    }
}
