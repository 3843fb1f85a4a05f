//! AddMovieToCartHandler - Command handler for adding a movie to the cart.

use std::sync::Arc;

use crate::domain::cart::{CartError, CartLine};
use crate::domain::foundation::{ErrorCode, MovieId, UserId};
use crate::ports::{CartRepository, CatalogLookup, OrderRepository};

/// Command to add one movie to the caller's cart.
#[derive(Debug, Clone)]
pub struct AddMovieToCartCommand {
    pub user_id: UserId,
    pub movie_id: MovieId,
}

#[derive(Debug, Clone)]
pub struct AddMovieToCartResult {
    pub line: CartLine,
}

/// Adds a movie after checking the catalog and the user's purchases.
///
/// Uniqueness of the line is enforced again by the repository, so two
/// concurrent adds of the same movie leave exactly one line.
pub struct AddMovieToCartHandler {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogLookup>,
}

impl AddMovieToCartHandler {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogLookup>,
    ) -> Self {
        Self {
            carts,
            orders,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: AddMovieToCartCommand,
    ) -> Result<AddMovieToCartResult, CartError> {
        // 1. Movie must exist in the catalog
        if self.catalog.get_movie(cmd.movie_id).await?.is_none() {
            return Err(CartError::movie_not_found(cmd.movie_id));
        }

        // 2. Paid movies cannot be bought again
        let purchased = self.orders.purchased_movie_ids(&cmd.user_id).await?;
        if purchased.contains(&cmd.movie_id) {
            return Err(CartError::already_purchased(cmd.movie_id));
        }

        // 3. Append the line
        let mut cart = self.carts.get_or_create(&cmd.user_id).await?;
        let line = cart.add_line(cmd.movie_id)?;

        self.carts
            .add_line(cart.id, &line)
            .await
            .map_err(|e| match e.code {
                ErrorCode::MovieAlreadyInCart => CartError::already_in_cart(cmd.movie_id),
                _ => CartError::from(e),
            })?;

        tracing::debug!(
            user_id = %cmd.user_id,
            movie_id = %cmd.movie_id,
            "Movie added to cart"
        );

        Ok(AddMovieToCartResult { line })
    }
}
