//! PostgreSQL implementation of CartRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartLine};
use crate::domain::foundation::{CartId, DomainError, ErrorCode, MovieId, Timestamp, UserId};
use crate::ports::CartRepository;

use super::common::{db_error, movie_id, user_id, violates, CART_LINE_UNIQUE};

#[derive(Clone)]
pub struct PostgresCartRepository {
    pool: PgPool,
}

impl PostgresCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load(&self, row: CartRow) -> Result<Cart, DomainError> {
        let lines: Vec<CartLineRow> = sqlx::query_as(
            r#"
            SELECT movie_id, added_at
            FROM cart_lines
            WHERE cart_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load cart lines", e))?;

        Ok(Cart {
            id: CartId::from_uuid(row.id),
            user_id: user_id(row.user_id)?,
            lines: lines
                .into_iter()
                .map(CartLine::try_from)
                .collect::<Result<_, _>>()?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    movie_id: i64,
    added_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = DomainError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(CartLine {
            movie_id: movie_id(row.movie_id)?,
            added_at: Timestamp::from_datetime(row.added_at),
        })
    }
}

#[async_trait]
impl CartRepository for PostgresCartRepository {
    async fn get_or_create(&self, user: &UserId) -> Result<Cart, DomainError> {
        let fresh = Cart::new(user.clone());

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(fresh.id.as_uuid())
        .bind(user.as_str())
        .bind(fresh.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create cart", e))?;

        self.find_by_user(user)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::CartNotFound, "Cart vanished after insert"))
    }

    async fn find_by_user(&self, user: &UserId) -> Result<Option<Cart>, DomainError> {
        let row: Option<CartRow> =
            sqlx::query_as("SELECT id, user_id, created_at FROM carts WHERE user_id = $1")
                .bind(user.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find cart", e))?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn add_line(&self, cart_id: CartId, line: &CartLine) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (cart_id, movie_id, added_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(cart_id.as_uuid())
        .bind(line.movie_id.value())
        .bind(line.added_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, CART_LINE_UNIQUE) {
                return DomainError::new(
                    ErrorCode::MovieAlreadyInCart,
                    format!("Movie {} is already in the cart", line.movie_id),
                );
            }
            db_error("Failed to add cart line", e)
        })?;

        Ok(())
    }

    async fn remove_line(&self, cart_id: CartId, movie: MovieId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1 AND movie_id = $2")
            .bind(cart_id.as_uuid())
            .bind(movie.value())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to remove cart line", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, cart_id: CartId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to clear cart", e))?;

        Ok(result.rows_affected())
    }
}
