//! PostgreSQL catalog lookup.
//!
//! Reads the `movies` table owned by the catalog service; this adapter never
//! writes to it.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, MovieId};
use crate::ports::{CatalogLookup, MovieListing};

use super::common::{db_error, money, movie_id};

#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: i64,
    name: String,
    price: Decimal,
}

impl TryFrom<MovieRow> for MovieListing {
    type Error = DomainError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        Ok(MovieListing {
            id: movie_id(row.id)?,
            name: row.name,
            price: money("movies.price", row.price)?,
        })
    }
}

#[async_trait]
impl CatalogLookup for PostgresCatalog {
    async fn get_movie(&self, id: MovieId) -> Result<Option<MovieListing>, DomainError> {
        let row: Option<MovieRow> = sqlx::query_as("SELECT id, name, price FROM movies WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to look up movie", e))?;

        row.map(MovieListing::try_from).transpose()
    }

    async fn get_movies(
        &self,
        ids: &[MovieId],
    ) -> Result<HashMap<MovieId, MovieListing>, DomainError> {
        let raw: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let rows: Vec<MovieRow> =
            sqlx::query_as("SELECT id, name, price FROM movies WHERE id = ANY($1)")
                .bind(&raw)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("Failed to look up movies", e))?;

        rows.into_iter()
            .map(|row| MovieListing::try_from(row).map(|m| (m.id, m)))
            .collect()
    }
}
