//! Helpers shared by the PostgreSQL repositories.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode, Money, MovieId, UserId};

/// Unique index allowing one pending payment per order.
pub(super) const ONE_PENDING_PAYMENT_INDEX: &str = "payments_one_pending_per_order";

/// Unique constraint on (cart_id, movie_id).
pub(super) const CART_LINE_UNIQUE: &str = "cart_lines_cart_id_movie_id_key";

pub(super) fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

/// True when `e` violates the named unique constraint or index.
pub(super) fn violates(e: &sqlx::Error, constraint: &str) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

pub(super) async fn begin(pool: &PgPool) -> Result<Transaction<'static, Postgres>, DomainError> {
    pool.begin()
        .await
        .map_err(|e| db_error("Failed to begin transaction", e))
}

pub(super) async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DomainError> {
    tx.commit()
        .await
        .map_err(|e| db_error("Failed to commit transaction", e))
}

pub(super) fn money(column: &str, value: Decimal) -> Result<Money, DomainError> {
    Money::from_decimal(value).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid amount in {}: {}", column, e),
        )
    })
}

pub(super) fn user_id(value: String) -> Result<UserId, DomainError> {
    UserId::new(value)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e)))
}

pub(super) fn movie_id(value: i64) -> Result<MovieId, DomainError> {
    MovieId::new(value)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid movie_id: {}", e)))
}

/// Parses a stored status token.
pub(super) fn status<S>(value: &str) -> Result<S, DomainError>
where
    S: std::str::FromStr,
    S::Err: std::fmt::Display,
{
    value.parse::<S>().map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value '{}': {}", value, e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::domain::payment::PaymentStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn status_tokens_round_trip() {
        for s in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Canceled] {
            assert_eq!(status::<OrderStatus>(s.as_str()).unwrap(), s);
        }
        for s in [
            PaymentStatus::Pending,
            PaymentStatus::Successful,
            PaymentStatus::Canceled,
            PaymentStatus::Refunded,
            PaymentStatus::Expired,
        ] {
            assert_eq!(status::<PaymentStatus>(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn unknown_status_is_database_error() {
        let err = status::<OrderStatus>("shipped").unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(money("orders.total_amount", dec!(-1.00)).is_err());
        assert_eq!(
            money("orders.total_amount", dec!(12.99)).unwrap().amount(),
            dec!(12.99)
        );
    }

    #[test]
    fn non_database_errors_never_match_constraints() {
        assert!(!violates(&sqlx::Error::RowNotFound, CART_LINE_UNIQUE));
    }
}
