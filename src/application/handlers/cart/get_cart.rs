//! GetCartHandler - Query handler for a user's cart.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::cart::{Cart, CartError};
use crate::domain::foundation::{Money, MovieId, UserId};
use crate::ports::{CartRepository, CatalogLookup, MovieListing};

/// Query for the caller's own cart.
#[derive(Debug, Clone)]
pub struct GetCartQuery {
    pub user_id: UserId,
}

/// Cart with current catalog listings for its lines.
#[derive(Debug, Clone)]
pub struct GetCartResult {
    pub cart: Cart,
    /// Listings keyed by movie; movies the catalog dropped are absent.
    pub listings: HashMap<MovieId, MovieListing>,
}

impl GetCartResult {
    /// Sum of current catalog prices of the lines still listed.
    pub fn current_total(&self) -> Money {
        self.cart
            .lines
            .iter()
            .filter_map(|line| self.listings.get(&line.movie_id))
            .map(|listing| listing.price)
            .sum()
    }
}

/// Returns the user's cart, creating an empty one on first access.
pub struct GetCartHandler {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn CatalogLookup>,
}

impl GetCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { carts, catalog }
    }

    pub async fn handle(&self, query: GetCartQuery) -> Result<GetCartResult, CartError> {
        let cart = self.carts.get_or_create(&query.user_id).await?;
        let listings = if cart.is_empty() {
            HashMap::new()
        } else {
            self.catalog.get_movies(&cart.movie_ids()).await?
        };

        Ok(GetCartResult { cart, listings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryCatalog, InMemoryStore};
    use crate::domain::cart::CartLine;
    use rust_decimal_macros::dec;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn movie(id: i64) -> MovieId {
        MovieId::new(id).unwrap()
    }

    #[tokio::test]
    async fn creates_empty_cart_on_first_access() {
        let store = Arc::new(InMemoryStore::new());
        let handler = GetCartHandler::new(store.clone(), Arc::new(InMemoryCatalog::new()));

        let first = handler.handle(GetCartQuery { user_id: user() }).await.unwrap();
        let second = handler.handle(GetCartQuery { user_id: user() }).await.unwrap();

        assert!(first.cart.is_empty());
        assert_eq!(first.cart.id, second.cart.id);
        assert!(first.current_total().is_zero());
    }

    #[tokio::test]
    async fn attaches_current_listings() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog
            .insert(movie(7), "Metropolis", Money::from_decimal(dec!(12.99)).unwrap())
            .await;

        let cart = store.get_or_create(&user()).await.unwrap();
        store.add_line(cart.id, &CartLine::new(movie(7))).await.unwrap();
        store.add_line(cart.id, &CartLine::new(movie(8))).await.unwrap();

        let handler = GetCartHandler::new(store, catalog);
        let result = handler.handle(GetCartQuery { user_id: user() }).await.unwrap();

        assert_eq!(result.cart.lines.len(), 2);
        assert_eq!(result.listings.len(), 1);
        assert_eq!(result.listings[&movie(7)].name, "Metropolis");
        assert_eq!(result.current_total().amount(), dec!(12.99));
    }
}
