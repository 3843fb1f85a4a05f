//! PostgreSQL implementation of PaymentRepository.
//!
//! A payment attempt locks the order row (`FOR UPDATE`), re-checks that it is
//! still pending and inserts the pending payment inside a transaction that
//! stays open across the gateway call. Cancels and reconciliations of the
//! same order wait for it. The partial unique index
//! `payments_one_pending_per_order` makes a concurrent second attempt block
//! on the first and fail once it commits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, OrderId, OrderLineId, PaymentId, PaymentLineId, Timestamp, UserId,
};
use crate::domain::order::OrderStatus;
use crate::domain::payment::{Payment, PaymentChanges, PaymentLine};
use crate::ports::{
    LockedPayment, PaymentAttempt, PaymentFilter, PaymentPage, PaymentRepository,
    PaymentStatistics,
};

use super::common::{
    begin, commit, db_error, money, status, user_id, violates, ONE_PENDING_PAYMENT_INDEX,
};

#[derive(Clone)]
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn page(&self, filter: &PaymentFilter) -> Result<PaymentPage, DomainError> {
        let user = filter.user_id.as_ref().map(|u| u.as_str());
        let payment_status = filter.status.map(|s| s.as_str());
        let from = filter.created_from.map(|t| *t.as_datetime());
        let to = filter.created_to.map(|t| *t.as_datetime());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM payments {}", FILTER_CLAUSE))
            .bind(user)
            .bind(payment_status)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count payments", e))?;

        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments {} ORDER BY created_at DESC OFFSET $5 LIMIT $6",
            PAYMENT_COLUMNS, FILTER_CLAUSE
        ))
        .bind(user)
        .bind(payment_status)
        .bind(from)
        .bind(to)
        .bind(i64::from(filter.skip))
        .bind(i64::from(filter.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list payments", e))?;

        Ok(PaymentPage {
            items: hydrate(&self.pool, rows).await?,
            total: total.max(0) as u64,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, user_id, order_id, status, amount, \
     external_session_id, external_payment_id, created_at";

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::text IS NULL OR user_id = $1)
      AND ($2::text IS NULL OR status = $2)
      AND ($3::timestamptz IS NULL OR created_at >= $3)
      AND ($4::timestamptz IS NULL OR created_at <= $4)
"#;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: String,
    order_id: Uuid,
    status: String,
    amount: Decimal,
    external_session_id: Option<String>,
    external_payment_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentLineRow {
    id: Uuid,
    payment_id: Uuid,
    order_line_id: Uuid,
    price_at_payment: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct StatisticsRow {
    total_amount: Decimal,
    collected_amount: Decimal,
    total_payments: i64,
    successful_payments: i64,
    refunded_payments: i64,
}

impl TryFrom<PaymentLineRow> for PaymentLine {
    type Error = DomainError;

    fn try_from(row: PaymentLineRow) -> Result<Self, Self::Error> {
        Ok(PaymentLine {
            id: PaymentLineId::from_uuid(row.id),
            order_line_id: OrderLineId::from_uuid(row.order_line_id),
            price_at_payment: money("payment_lines.price_at_payment", row.price_at_payment)?,
        })
    }
}

fn assemble(row: PaymentRow, lines: Vec<PaymentLine>) -> Result<Payment, DomainError> {
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        user_id: user_id(row.user_id)?,
        order_id: OrderId::from_uuid(row.order_id),
        status: status(&row.status)?,
        amount: money("payments.amount", row.amount)?,
        external_session_id: row.external_session_id,
        external_payment_id: row.external_payment_id,
        lines,
        created_at: Timestamp::from_datetime(row.created_at),
    })
}

async fn hydrate<'e, E>(executor: E, rows: Vec<PaymentRow>) -> Result<Vec<Payment>, DomainError>
where
    E: PgExecutor<'e>,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let line_rows: Vec<PaymentLineRow> = sqlx::query_as(
        r#"
        SELECT id, payment_id, order_line_id, price_at_payment
        FROM payment_lines
        WHERE payment_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error("Failed to load payment lines", e))?;

    let mut by_payment: HashMap<Uuid, Vec<PaymentLine>> = HashMap::new();
    for row in line_rows {
        let payment_id = row.payment_id;
        by_payment
            .entry(payment_id)
            .or_default()
            .push(PaymentLine::try_from(row)?);
    }

    rows.into_iter()
        .map(|row| {
            let lines = by_payment.remove(&row.id).unwrap_or_default();
            assemble(row, lines)
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════
// Transactional handles
// ════════════════════════════════════════════════════════════════════

struct PgPaymentAttempt {
    tx: Transaction<'static, Postgres>,
    payment: Payment,
}

#[async_trait]
impl PaymentAttempt for PgPaymentAttempt {
    fn payment(&self) -> &Payment {
        &self.payment
    }

    async fn commit(mut self: Box<Self>, session_id: &str) -> Result<Payment, DomainError> {
        sqlx::query("UPDATE payments SET external_session_id = $2 WHERE id = $1")
            .bind(self.payment.id.as_uuid())
            .bind(session_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to store checkout session", e))?;

        let mut payment = self.payment;
        commit(self.tx).await?;
        payment.attach_session(session_id);
        Ok(payment)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| db_error("Failed to roll back payment attempt", e))
    }
}

struct PgLockedPayment {
    tx: Transaction<'static, Postgres>,
    payment: Payment,
    order_status: Option<OrderStatus>,
}

#[async_trait]
impl LockedPayment for PgLockedPayment {
    fn payment(&self) -> &Payment {
        &self.payment
    }

    fn order_status(&self) -> Option<OrderStatus> {
        self.order_status
    }

    async fn commit(mut self: Box<Self>, changes: &PaymentChanges) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE payments SET
                status = COALESCE($2, status),
                external_payment_id = COALESCE($3, external_payment_id)
            WHERE id = $1
            "#,
        )
        .bind(self.payment.id.as_uuid())
        .bind(changes.payment_status.map(|s| s.as_str()))
        .bind(changes.payment_intent_id.as_deref())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update payment", e))?;

        if let Some(order_status) = changes.order_status {
            sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
                .bind(self.payment.order_id.as_uuid())
                .bind(order_status.as_str())
                .execute(&mut *self.tx)
                .await
                .map_err(|e| db_error("Failed to update order status", e))?;
        }

        commit(self.tx).await
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn begin_attempt(
        &self,
        payment: &Payment,
    ) -> Result<Box<dyn PaymentAttempt>, DomainError> {
        let mut tx = begin(&self.pool).await?;

        let order_status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(payment.order_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to lock order", e))?;
        let Some(order_status) = order_status else {
            return Err(DomainError::new(ErrorCode::OrderNotFound, "Order not found"));
        };
        status::<OrderStatus>(&order_status)?.ensure_payable()?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, order_id, status, amount,
                external_session_id, external_payment_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_str())
        .bind(payment.order_id.as_uuid())
        .bind(payment.status.as_str())
        .bind(payment.amount.amount())
        .bind(&payment.external_session_id)
        .bind(&payment.external_payment_id)
        .bind(payment.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, ONE_PENDING_PAYMENT_INDEX) {
                return DomainError::new(
                    ErrorCode::PaymentAlreadyInProgress,
                    "A payment for this order is already in progress",
                );
            }
            db_error("Failed to insert payment", e)
        })?;

        for line in &payment.lines {
            sqlx::query(
                r#"
                INSERT INTO payment_lines (id, payment_id, order_line_id, price_at_payment)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(payment.id.as_uuid())
            .bind(line.order_line_id.as_uuid())
            .bind(line.price_at_payment.amount())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to insert payment line", e))?;
        }

        Ok(Box::new(PgPaymentAttempt {
            tx,
            payment: payment.clone(),
        }))
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find payment", e))?;

        match row {
            Some(row) => Ok(hydrate(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM payments
            WHERE external_session_id = $1 OR external_payment_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment by reference", e))?;

        match row {
            Some(row) => Ok(hydrate(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn lock_for_reconciliation(
        &self,
        id: PaymentId,
    ) -> Result<Option<Box<dyn LockedPayment>>, DomainError> {
        let mut tx = begin(&self.pool).await?;

        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = $1 FOR UPDATE",
            PAYMENT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock payment", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order_id = row.order_id;
        let Some(payment) = hydrate(&mut *tx, vec![row]).await?.pop() else {
            return Ok(None);
        };

        let order_status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to lock order", e))?;
        let order_status: Option<OrderStatus> =
            order_status.as_deref().map(status).transpose()?;

        Ok(Some(Box::new(PgLockedPayment {
            tx,
            payment,
            order_status,
        })))
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        skip: u32,
        limit: u32,
    ) -> Result<PaymentPage, DomainError> {
        self.page(&PaymentFilter {
            user_id: Some(user.clone()),
            skip,
            limit,
            ..Default::default()
        })
        .await
    }

    async fn list(&self, filter: &PaymentFilter) -> Result<PaymentPage, DomainError> {
        self.page(filter).await
    }

    async fn statistics(
        &self,
        created_from: Option<Timestamp>,
        created_to: Option<Timestamp>,
    ) -> Result<PaymentStatistics, DomainError> {
        let row: StatisticsRow = sqlx::query_as(&format!(
            r#"
            SELECT
                COALESCE(SUM(amount), 0) AS total_amount,
                COALESCE(SUM(amount) FILTER (WHERE status = 'successful'), 0) AS collected_amount,
                COUNT(*) AS total_payments,
                COUNT(*) FILTER (WHERE status = 'successful') AS successful_payments,
                COUNT(*) FILTER (WHERE status = 'refunded') AS refunded_payments
            FROM payments
            {}
            "#,
            FILTER_CLAUSE
        ))
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .bind(created_from.map(|t| *t.as_datetime()))
        .bind(created_to.map(|t| *t.as_datetime()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to compute payment statistics", e))?;

        Ok(PaymentStatistics::new(
            money("payments.amount", row.total_amount)?,
            money("payments.amount", row.collected_amount)?,
            row.total_payments.max(0) as u64,
            row.successful_payments.max(0) as u64,
            row.refunded_payments.max(0) as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentStatus;
    use rust_decimal_macros::dec;

    fn row(status: &str) -> PaymentRow {
        PaymentRow {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            order_id: Uuid::new_v4(),
            status: status.to_string(),
            amount: dec!(12.99),
            external_session_id: Some("cs_1".to_string()),
            external_payment_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn assemble_keeps_external_references() {
        let payment = assemble(row("pending"), vec![]).unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.external_session_id.as_deref(), Some("cs_1"));
        assert!(payment.external_payment_id.is_none());
    }

    #[test]
    fn assemble_rejects_unknown_status() {
        assert!(assemble(row("chargeback"), vec![]).is_err());
    }

    #[test]
    fn filter_clause_uses_four_positional_parameters() {
        for n in 1..=4 {
            assert!(FILTER_CLAUSE.contains(&format!("${}", n)));
        }
        assert!(!FILTER_CLAUSE.contains("$5"));
    }
}
