//! Payment repository port.
//!
//! # Transactional units
//!
//! - [`PaymentAttempt`]: the pending payment row is written inside an open
//!   transaction that stays open across the gateway call. `commit` stores the
//!   session id, `rollback` (or dropping the handle) leaves nothing behind.
//! - [`LockedPayment`]: the payment row and its order row locked together so a
//!   webhook decision is made from, and written against, the same state.

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::foundation::{DomainError, Money, PaymentId, Timestamp, UserId};
use crate::domain::order::OrderStatus;
use crate::domain::payment::{Payment, PaymentChanges, PaymentStatus};

/// Admin filter over all payments.
#[derive(Debug, Clone)]
pub struct PaymentFilter {
    pub user_id: Option<UserId>,
    pub status: Option<PaymentStatus>,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for PaymentFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            status: None,
            created_from: None,
            created_to: None,
            skip: 0,
            limit: 20,
        }
    }
}

impl PaymentFilter {
    /// True when `payment` passes every criterion (paging aside).
    pub fn matches(&self, payment: &Payment) -> bool {
        self.user_id.as_ref().map_or(true, |u| &payment.user_id == u)
            && self.status.map_or(true, |s| payment.status == s)
            && self
                .created_from
                .map_or(true, |from| !payment.created_at.is_before(&from))
            && self
                .created_to
                .map_or(true, |to| !payment.created_at.is_after(&to))
    }
}

/// One page of payments plus the unpaged count.
#[derive(Debug, Clone)]
pub struct PaymentPage {
    pub items: Vec<Payment>,
    pub total: u64,
}

/// Aggregates over payments in a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatistics {
    /// Sum of every payment amount, whatever its status.
    pub total_amount: Money,
    /// Sum of successful payments.
    pub collected_amount: Money,
    pub total_payments: u64,
    pub successful_payments: u64,
    pub refunded_payments: u64,
    /// Successful payments as a percentage of all payments, two decimals.
    pub success_rate: Decimal,
}

impl PaymentStatistics {
    pub fn new(
        total_amount: Money,
        collected_amount: Money,
        total_payments: u64,
        successful_payments: u64,
        refunded_payments: u64,
    ) -> Self {
        let success_rate = if total_payments == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(successful_payments) * Decimal::ONE_HUNDRED
                / Decimal::from(total_payments))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        Self {
            total_amount,
            collected_amount,
            total_payments,
            successful_payments,
            refunded_payments,
            success_rate,
        }
    }

    /// Folds an in-memory list of payments.
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Self {
        let mut total_amount = Money::zero();
        let mut collected_amount = Money::zero();
        let (mut total, mut successful, mut refunded) = (0u64, 0u64, 0u64);

        for payment in payments {
            total += 1;
            total_amount = total_amount + payment.amount;
            match payment.status {
                PaymentStatus::Successful => {
                    successful += 1;
                    collected_amount = collected_amount + payment.amount;
                }
                PaymentStatus::Refunded => refunded += 1,
                _ => {}
            }
        }

        Self::new(total_amount, collected_amount, total, successful, refunded)
    }
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Opens a payment attempt with `payment` (status pending) written but
    /// not yet committed. The attempt locks the payment's order and re-reads
    /// its status; the lock is held until commit or rollback.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` when the order is gone
    /// - `OrderNotPayable` when the order is no longer pending
    /// - `PaymentAlreadyInProgress` when the order already has a pending
    ///   payment
    /// - `DatabaseError` on persistence failure
    async fn begin_attempt(&self, payment: &Payment)
        -> Result<Box<dyn PaymentAttempt>, DomainError>;

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError>;

    /// Finds the payment whose session id or payment intent id is `reference`.
    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Locks the payment and its order for a reconciliation decision.
    async fn lock_for_reconciliation(
        &self,
        id: PaymentId,
    ) -> Result<Option<Box<dyn LockedPayment>>, DomainError>;

    /// The user's payments, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        skip: u32,
        limit: u32,
    ) -> Result<PaymentPage, DomainError>;

    /// All payments matching `filter`, newest first.
    async fn list(&self, filter: &PaymentFilter) -> Result<PaymentPage, DomainError>;

    async fn statistics(
        &self,
        created_from: Option<Timestamp>,
        created_to: Option<Timestamp>,
    ) -> Result<PaymentStatistics, DomainError>;
}

/// An uncommitted payment attempt.
#[async_trait]
pub trait PaymentAttempt: Send {
    fn payment(&self) -> &Payment;

    /// Stores the gateway session id and commits the payment.
    async fn commit(self: Box<Self>, session_id: &str) -> Result<Payment, DomainError>;

    /// Discards the payment.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

/// A payment locked together with its order.
#[async_trait]
pub trait LockedPayment: Send {
    fn payment(&self) -> &Payment;

    /// Status of the payment's order, `None` when the order row is gone.
    fn order_status(&self) -> Option<OrderStatus>;

    /// Applies `changes` to both rows and commits.
    async fn commit(self: Box<Self>, changes: &PaymentChanges) -> Result<(), DomainError>;
}
