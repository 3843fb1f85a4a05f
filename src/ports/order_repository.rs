//! Order repository port.
//!
//! Besides plain reads, the port exposes the two transactional units the
//! order lifecycle needs: checkout (order insert plus cart line removal) and
//! a row lock for status changes.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::foundation::{CartId, DomainError, MovieId, OrderId, Timestamp, UserId};
use crate::domain::order::{Order, OrderStatus};

/// Admin filter over all orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.as_ref().map_or(true, |u| &order.user_id == u)
            && self.status.map_or(true, |s| order.status == s)
            && self
                .created_from
                .map_or(true, |from| !order.created_at.is_before(&from))
            && self
                .created_to
                .map_or(true, |to| !order.created_at.is_after(&to))
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Movies the user owns through a paid order.
    async fn purchased_movie_ids(&self, user_id: &UserId) -> Result<HashSet<MovieId>, DomainError>;

    /// Movies sitting in the user's pending orders.
    async fn pending_movie_ids(&self, user_id: &UserId) -> Result<HashSet<MovieId>, DomainError>;

    /// Persists `order` and removes exactly its movies from the cart, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// - `CheckoutConflict` when a converted line is no longer in the cart;
    ///   nothing is written in that case
    /// - `DatabaseError` on persistence failure
    async fn create_from_cart(&self, order: &Order, cart_id: CartId) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError>;

    /// Locks the order row until the returned handle commits or drops.
    async fn lock_for_update(&self, id: OrderId) -> Result<Option<Box<dyn OrderLock>>, DomainError>;

    /// The user's orders, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError>;

    /// All orders matching `filter`, newest first.
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError>;
}

/// A locked order. Dropping the handle releases the lock without writing.
#[async_trait]
pub trait OrderLock: Send {
    /// The order as re-read under the lock.
    fn order(&self) -> &Order;

    /// Writes the new status and releases the lock.
    async fn commit_status(self: Box<Self>, status: OrderStatus) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{CheckoutPlan, PlannedLine};
    use crate::domain::foundation::Money;

    fn order(user: &str) -> Order {
        let plan = CheckoutPlan {
            lines: vec![PlannedLine {
                movie_id: MovieId::new(1).unwrap(),
                price: Money::zero(),
            }],
            excluded: vec![],
        };
        Order::place(UserId::new(user).unwrap(), &plan).unwrap()
    }

    #[test]
    fn order_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn OrderRepository) {}
        fn _accepts_lock(_lock: Box<dyn OrderLock>) {}
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(OrderFilter::default().matches(&order("a")));
    }

    #[test]
    fn filter_by_user_and_status() {
        let filter = OrderFilter {
            user_id: Some(UserId::new("a").unwrap()),
            status: Some(OrderStatus::Pending),
            ..Default::default()
        };
        assert!(filter.matches(&order("a")));
        assert!(!filter.matches(&order("b")));

        let paid_only = OrderFilter {
            status: Some(OrderStatus::Paid),
            ..Default::default()
        };
        assert!(!paid_only.matches(&order("a")));
    }

    #[test]
    fn filter_by_creation_window() {
        let o = order("a");
        let future = OrderFilter {
            created_from: Some(o.created_at.plus_minutes(5)),
            ..Default::default()
        };
        assert!(!future.matches(&o));
    }
}
