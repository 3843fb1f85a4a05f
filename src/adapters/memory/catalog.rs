//! In-memory catalog.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Money, MovieId};
use crate::ports::{CatalogLookup, MovieListing};

/// Movie listings held in memory; prices can be changed at runtime.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    movies: Arc<RwLock<HashMap<MovieId, MovieListing>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: MovieId, name: impl Into<String>, price: Money) {
        self.movies.write().await.insert(
            id,
            MovieListing {
                id,
                name: name.into(),
                price,
            },
        );
    }

    /// Changes the current price; existing orders keep theirs.
    pub async fn set_price(&self, id: MovieId, price: Money) {
        if let Some(listing) = self.movies.write().await.get_mut(&id) {
            listing.price = price;
        }
    }

    pub async fn remove(&self, id: MovieId) {
        self.movies.write().await.remove(&id);
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn get_movie(&self, id: MovieId) -> Result<Option<MovieListing>, DomainError> {
        Ok(self.movies.read().await.get(&id).cloned())
    }
}
