//! Catalog lookup port (read-only).
//!
//! The movie catalog is owned elsewhere; this core only needs to resolve a
//! movie id to its display name and current price.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Money, MovieId};

/// What the storefront needs to know about a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieListing {
    pub id: MovieId,
    pub name: String,
    pub price: Money,
}

/// Port for resolving movies.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Returns `None` when the movie does not exist or is no longer sold.
    async fn get_movie(&self, id: MovieId) -> Result<Option<MovieListing>, DomainError>;

    /// Resolves several movies at once; unknown ids are simply absent.
    async fn get_movies(
        &self,
        ids: &[MovieId],
    ) -> Result<HashMap<MovieId, MovieListing>, DomainError> {
        let mut found = HashMap::with_capacity(ids.len());
        for &id in ids {
            if let Some(listing) = self.get_movie(id).await? {
                found.insert(id, listing);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup_is_object_safe() {
        fn _accepts_dyn(_catalog: &dyn CatalogLookup) {}
    }
}
