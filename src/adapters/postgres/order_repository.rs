//! PostgreSQL implementation of OrderRepository.
//!
//! Checkout locks the cart row, deletes exactly the converted lines and
//! inserts the order with its lines in one transaction. Status changes go
//! through a `SELECT ... FOR UPDATE` handle.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{
    CartId, DomainError, ErrorCode, MovieId, OrderId, OrderLineId, Timestamp, UserId,
};
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::ports::{OrderFilter, OrderLock, OrderRepository};

use super::common::{begin, commit, db_error, money, movie_id, status, user_id};

#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn movies_with_status(
        &self,
        user: &UserId,
        order_status: OrderStatus,
    ) -> Result<HashSet<MovieId>, DomainError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT ol.movie_id
            FROM order_lines ol
            JOIN orders o ON o.id = ol.order_id
            WHERE o.user_id = $1 AND o.status = $2
            "#,
        )
        .bind(user.as_str())
        .bind(order_status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load movie ids", e))?;

        ids.into_iter().map(movie_id).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: String,
    status: String,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: Uuid,
    order_id: Uuid,
    movie_id: i64,
    price_at_order: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = DomainError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        Ok(OrderLine {
            id: OrderLineId::from_uuid(row.id),
            movie_id: movie_id(row.movie_id)?,
            price_at_order: money("order_lines.price_at_order", row.price_at_order)?,
        })
    }
}

fn assemble(row: OrderRow, lines: Vec<OrderLine>) -> Result<Order, DomainError> {
    Ok(Order {
        id: OrderId::from_uuid(row.id),
        user_id: user_id(row.user_id)?,
        status: status(&row.status)?,
        total_amount: money("orders.total_amount", row.total_amount)?,
        lines,
        created_at: Timestamp::from_datetime(row.created_at),
    })
}

/// Loads the lines of `rows` with one query and builds the orders.
async fn hydrate<'e, E>(executor: E, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError>
where
    E: PgExecutor<'e>,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let line_rows: Vec<OrderLineRow> = sqlx::query_as(
        r#"
        SELECT id, order_id, movie_id, price_at_order
        FROM order_lines
        WHERE order_id = ANY($1)
        ORDER BY movie_id
        "#,
    )
    .bind(&ids)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error("Failed to load order lines", e))?;

    let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in line_rows {
        let order_id = row.order_id;
        by_order
            .entry(order_id)
            .or_default()
            .push(OrderLine::try_from(row)?);
    }

    rows.into_iter()
        .map(|row| {
            let lines = by_order.remove(&row.id).unwrap_or_default();
            assemble(row, lines)
        })
        .collect()
}

const ORDER_COLUMNS: &str = "id, user_id, status, total_amount, created_at";

struct PgOrderLock {
    tx: Transaction<'static, Postgres>,
    order: Order,
}

#[async_trait]
impl OrderLock for PgOrderLock {
    fn order(&self) -> &Order {
        &self.order
    }

    async fn commit_status(mut self: Box<Self>, new_status: OrderStatus) -> Result<(), DomainError> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(self.order.id.as_uuid())
            .bind(new_status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to update order status", e))?;

        commit(self.tx).await
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn purchased_movie_ids(&self, user: &UserId) -> Result<HashSet<MovieId>, DomainError> {
        self.movies_with_status(user, OrderStatus::Paid).await
    }

    async fn pending_movie_ids(&self, user: &UserId) -> Result<HashSet<MovieId>, DomainError> {
        self.movies_with_status(user, OrderStatus::Pending).await
    }

    async fn create_from_cart(&self, order: &Order, cart_id: CartId) -> Result<(), DomainError> {
        let mut tx = begin(&self.pool).await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
            .bind(cart_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock cart", e))?;
        if locked.is_none() {
            return Err(DomainError::new(ErrorCode::CartNotFound, "Cart not found"));
        }

        let movie_ids: Vec<i64> = order.movie_ids().iter().map(|m| m.value()).collect();
        let removed = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1 AND movie_id = ANY($2)")
            .bind(cart_id.as_uuid())
            .bind(&movie_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to remove converted cart lines", e))?;

        if removed.rows_affected() != movie_ids.len() as u64 {
            // Dropping the transaction rolls back the deletions.
            return Err(DomainError::new(
                ErrorCode::CheckoutConflict,
                "Cart changed during checkout",
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total_amount, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(order.status.as_str())
        .bind(order.total_amount.amount())
        .bind(order.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert order", e))?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, movie_id, price_at_order)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(line.movie_id.value())
            .bind(line.price_at_order.amount())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to insert order line", e))?;
        }

        commit(tx).await
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find order", e))?;

        match row {
            Some(row) => Ok(hydrate(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn lock_for_update(&self, id: OrderId) -> Result<Option<Box<dyn OrderLock>>, DomainError> {
        let mut tx = begin(&self.pool).await?;

        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock order", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(order) = hydrate(&mut *tx, vec![row]).await?.pop() else {
            return Ok(None);
        };

        Ok(Some(Box::new(PgOrderLock { tx, order })))
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Order>, DomainError> {
        self.list(&OrderFilter {
            user_id: Some(user.clone()),
            ..Default::default()
        })
        .await
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM orders
            WHERE ($1::text IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at DESC
            "#,
            ORDER_COLUMNS
        ))
        .bind(filter.user_id.as_ref().map(|u| u.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.created_from.map(|t| *t.as_datetime()))
        .bind(filter.created_to.map(|t| *t.as_datetime()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list orders", e))?;

        hydrate(&self.pool, rows).await
    }
}
