//! In-memory storefront store.
//!
//! Carts, orders and payments live behind one async mutex. Lock handles
//! ([`OrderLock`], [`PaymentAttempt`], [`LockedPayment`]) own the guard, so a
//! handle excludes every other writer until it commits or drops, which is
//! what a row lock plus transaction gives the Postgres adapter.
//!
//! The lock is store-wide, not per order. A [`PaymentAttempt`] stays open
//! across the gateway call, so while one payment is being started every other
//! cart, order and webhook operation waits, for up to the configured gateway
//! timeout. Fine for tests and local runs; production uses Postgres.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::cart::{Cart, CartLine};
use crate::domain::foundation::{
    CartId, DomainError, ErrorCode, MovieId, OrderId, PaymentId, Timestamp, UserId,
};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::payment::{Payment, PaymentChanges};
use crate::ports::{
    CartRepository, LockedPayment, OrderFilter, OrderLock, OrderRepository, PaymentAttempt,
    PaymentFilter, PaymentPage, PaymentRepository, PaymentStatistics,
};

#[derive(Debug, Default)]
struct State {
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<PaymentId, Payment>,
}

impl State {
    fn cart_mut(&mut self, cart_id: CartId) -> Result<&mut Cart, DomainError> {
        self.carts
            .values_mut()
            .find(|c| c.id == cart_id)
            .ok_or_else(|| DomainError::new(ErrorCode::CartNotFound, "Cart not found"))
    }

    fn movies_with_status(&self, user_id: &UserId, status: OrderStatus) -> HashSet<MovieId> {
        self.orders
            .values()
            .filter(|o| &o.user_id == user_id && o.status == status)
            .flat_map(|o| o.movie_ids())
            .collect()
    }
}

/// In-memory implementation of the cart, order and payment repositories.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an order directly (useful for tests).
    pub async fn insert_order(&self, order: Order) {
        self.state.lock().await.orders.insert(order.id, order);
    }

    pub async fn payment_count(&self) -> usize {
        self.state.lock().await.payments.len()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> Timestamp) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

fn page(mut payments: Vec<Payment>, skip: u32, limit: u32) -> PaymentPage {
    newest_first(&mut payments, |p| p.created_at);
    let total = payments.len() as u64;
    let items = payments
        .into_iter()
        .skip(skip as usize)
        .take(limit as usize)
        .collect();
    PaymentPage { items, total }
}

// ════════════════════════════════════════════════════════════════════
// Cart
// ════════════════════════════════════════════════════════════════════

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn get_or_create(&self, user_id: &UserId) -> Result<Cart, DomainError> {
        let mut state = self.state.lock().await;
        let cart = state
            .carts
            .entry(user_id.clone())
            .or_insert_with(|| Cart::new(user_id.clone()));
        Ok(cart.clone())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Cart>, DomainError> {
        Ok(self.state.lock().await.carts.get(user_id).cloned())
    }

    async fn add_line(&self, cart_id: CartId, line: &CartLine) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let cart = state.cart_mut(cart_id)?;
        if cart.contains(line.movie_id) {
            return Err(DomainError::new(
                ErrorCode::MovieAlreadyInCart,
                "Movie is already in the cart",
            ));
        }
        cart.lines.push(line.clone());
        Ok(())
    }

    async fn remove_line(&self, cart_id: CartId, movie_id: MovieId) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        Ok(state.cart_mut(cart_id)?.remove_line(movie_id))
    }

    async fn clear(&self, cart_id: CartId) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;
        Ok(state.cart_mut(cart_id)?.clear() as u64)
    }
}

// ════════════════════════════════════════════════════════════════════
// Orders
// ════════════════════════════════════════════════════════════════════

struct MemoryOrderLock {
    guard: OwnedMutexGuard<State>,
    order: Order,
}

#[async_trait]
impl OrderLock for MemoryOrderLock {
    fn order(&self) -> &Order {
        &self.order
    }

    async fn commit_status(mut self: Box<Self>, status: OrderStatus) -> Result<(), DomainError> {
        let order = self
            .guard
            .orders
            .get_mut(&self.order.id)
            .ok_or_else(|| DomainError::new(ErrorCode::OrderNotFound, "Order not found"))?;
        order.status = status;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn purchased_movie_ids(&self, user_id: &UserId) -> Result<HashSet<MovieId>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.movies_with_status(user_id, OrderStatus::Paid))
    }

    async fn pending_movie_ids(&self, user_id: &UserId) -> Result<HashSet<MovieId>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.movies_with_status(user_id, OrderStatus::Pending))
    }

    async fn create_from_cart(&self, order: &Order, cart_id: CartId) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let cart = state.cart_mut(cart_id)?;

        let converted = order.movie_ids();
        if !converted.iter().all(|m| cart.contains(*m)) {
            return Err(DomainError::new(
                ErrorCode::CheckoutConflict,
                "Cart changed during checkout",
            ));
        }
        cart.remove_lines(&converted);
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn lock_for_update(&self, id: OrderId) -> Result<Option<Box<dyn OrderLock>>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        let Some(order) = guard.orders.get(&id).cloned() else {
            return Ok(None);
        };
        Ok(Some(Box::new(MemoryOrderLock { guard, order })))
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut orders, |o| o.created_at);
        Ok(orders)
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        newest_first(&mut orders, |o| o.created_at);
        Ok(orders)
    }
}

// ════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════

struct MemoryPaymentAttempt {
    guard: OwnedMutexGuard<State>,
    payment: Payment,
}

#[async_trait]
impl PaymentAttempt for MemoryPaymentAttempt {
    fn payment(&self) -> &Payment {
        &self.payment
    }

    async fn commit(mut self: Box<Self>, session_id: &str) -> Result<Payment, DomainError> {
        let mut payment = self.payment.clone();
        payment.attach_session(session_id);
        self.guard.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}

struct MemoryLockedPayment {
    guard: OwnedMutexGuard<State>,
    payment: Payment,
    order_status: Option<OrderStatus>,
}

#[async_trait]
impl LockedPayment for MemoryLockedPayment {
    fn payment(&self) -> &Payment {
        &self.payment
    }

    fn order_status(&self) -> Option<OrderStatus> {
        self.order_status
    }

    async fn commit(mut self: Box<Self>, changes: &PaymentChanges) -> Result<(), DomainError> {
        let payment_id = self.payment.id;
        let order_id = self.payment.order_id;

        let payment = self
            .guard
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "Payment not found"))?;
        if let Some(status) = changes.payment_status {
            payment.status = status;
        }
        if let Some(intent) = &changes.payment_intent_id {
            payment.external_payment_id = Some(intent.clone());
        }

        if let Some(status) = changes.order_status {
            if let Some(order) = self.guard.orders.get_mut(&order_id) {
                order.status = status;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn begin_attempt(
        &self,
        payment: &Payment,
    ) -> Result<Box<dyn PaymentAttempt>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        guard
            .orders
            .get(&payment.order_id)
            .ok_or_else(|| DomainError::new(ErrorCode::OrderNotFound, "Order not found"))?
            .status
            .ensure_payable()?;
        let in_flight = guard
            .payments
            .values()
            .any(|p| p.order_id == payment.order_id && p.status.is_in_flight());
        if in_flight {
            return Err(DomainError::new(
                ErrorCode::PaymentAlreadyInProgress,
                "A payment for this order is already in progress",
            ));
        }
        Ok(Box::new(MemoryPaymentAttempt {
            guard,
            payment: payment.clone(),
        }))
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.state.lock().await.payments.get(&id).cloned())
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .values()
            .find(|p| p.matches_reference(reference))
            .cloned())
    }

    async fn lock_for_reconciliation(
        &self,
        id: PaymentId,
    ) -> Result<Option<Box<dyn LockedPayment>>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        let Some(payment) = guard.payments.get(&id).cloned() else {
            return Ok(None);
        };
        let order_status = guard.orders.get(&payment.order_id).map(|o| o.status);
        Ok(Some(Box::new(MemoryLockedPayment {
            guard,
            payment,
            order_status,
        })))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        skip: u32,
        limit: u32,
    ) -> Result<PaymentPage, DomainError> {
        let state = self.state.lock().await;
        let payments = state
            .payments
            .values()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        Ok(page(payments, skip, limit))
    }

    async fn list(&self, filter: &PaymentFilter) -> Result<PaymentPage, DomainError> {
        let state = self.state.lock().await;
        let payments = state
            .payments
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(page(payments, filter.skip, filter.limit))
    }

    async fn statistics(
        &self,
        created_from: Option<Timestamp>,
        created_to: Option<Timestamp>,
    ) -> Result<PaymentStatistics, DomainError> {
        let filter = PaymentFilter {
            created_from,
            created_to,
            ..Default::default()
        };
        let state = self.state.lock().await;
        Ok(PaymentStatistics::from_payments(
            state.payments.values().filter(|p| filter.matches(p)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, OrderLineId};
    use crate::domain::order::{CheckoutPlan, PlannedLine};
    use crate::domain::payment::{PaymentStatus, PricedLine};
    use rust_decimal_macros::dec;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn movie(id: i64) -> MovieId {
        MovieId::new(id).unwrap()
    }

    fn order_for(movies: &[i64]) -> Order {
        let plan = CheckoutPlan {
            lines: movies
                .iter()
                .map(|id| PlannedLine {
                    movie_id: movie(*id),
                    price: Money::from_decimal(dec!(9.99)).unwrap(),
                })
                .collect(),
            excluded: vec![],
        };
        Order::place(user(), &plan).unwrap()
    }

    fn payment_for(order: &Order) -> Payment {
        Payment::start(
            order.user_id.clone(),
            order.id,
            &[PricedLine {
                order_line_id: OrderLineId::new(),
                movie_id: movie(1),
                price: order.total_amount,
            }],
        )
    }

    // ══════════════════════════════════════════════════════════════
    // Cart
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn get_or_create_returns_same_cart() {
        let store = InMemoryStore::new();
        let first = store.get_or_create(&user()).await.unwrap();
        let second = store.get_or_create(&user()).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn duplicate_line_is_rejected_with_code() {
        let store = InMemoryStore::new();
        let cart = store.get_or_create(&user()).await.unwrap();
        store.add_line(cart.id, &CartLine::new(movie(1))).await.unwrap();

        let err = store
            .add_line(cart.id, &CartLine::new(movie(1)))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::MovieAlreadyInCart);
    }

    // ══════════════════════════════════════════════════════════════
    // Checkout
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_from_cart_removes_only_converted_lines() {
        let store = InMemoryStore::new();
        let cart = store.get_or_create(&user()).await.unwrap();
        store.add_line(cart.id, &CartLine::new(movie(1))).await.unwrap();
        store.add_line(cart.id, &CartLine::new(movie(2))).await.unwrap();

        let order = order_for(&[1]);
        store.create_from_cart(&order, cart.id).await.unwrap();

        let cart = store.find_by_user(&user()).await.unwrap().unwrap();
        assert_eq!(cart.movie_ids(), vec![movie(2)]);
        assert!(OrderRepository::find_by_id(&store, order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_from_cart_conflicts_when_line_vanished() {
        let store = InMemoryStore::new();
        let cart = store.get_or_create(&user()).await.unwrap();
        store.add_line(cart.id, &CartLine::new(movie(1))).await.unwrap();

        let order = order_for(&[1, 2]);
        let err = store.create_from_cart(&order, cart.id).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CheckoutConflict);
        let cart = store.find_by_user(&user()).await.unwrap().unwrap();
        assert_eq!(cart.movie_ids(), vec![movie(1)]);
        assert!(OrderRepository::find_by_id(&store, order.id).await.unwrap().is_none());
    }

    // ══════════════════════════════════════════════════════════════
    // Payment attempts
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn second_attempt_for_same_order_is_rejected() {
        let store = InMemoryStore::new();
        let order = order_for(&[1]);
        store.insert_order(order.clone()).await;

        let attempt = store.begin_attempt(&payment_for(&order)).await.unwrap();
        attempt.commit("cs_1").await.unwrap();

        let err = match store.begin_attempt(&payment_for(&order)).await {
            Err(err) => err,
            Ok(_) => panic!("second attempt should fail"),
        };
        assert_eq!(err.code, ErrorCode::PaymentAlreadyInProgress);
    }

    #[tokio::test]
    async fn rolled_back_attempt_leaves_nothing() {
        let store = InMemoryStore::new();
        let order = order_for(&[1]);
        store.insert_order(order.clone()).await;

        let attempt = store.begin_attempt(&payment_for(&order)).await.unwrap();
        attempt.rollback().await.unwrap();

        assert_eq!(store.payment_count().await, 0);
        assert!(store.begin_attempt(&payment_for(&order)).await.is_ok());
    }

    #[tokio::test]
    async fn attempt_rechecks_order_status() {
        let store = InMemoryStore::new();
        let mut order = order_for(&[1]);
        order.cancel().unwrap();
        store.insert_order(order.clone()).await;

        let err = match store.begin_attempt(&payment_for(&order)).await {
            Err(err) => err,
            Ok(_) => panic!("canceled order should not take a payment"),
        };
        assert_eq!(err.code, ErrorCode::OrderNotPayable);
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn attempt_for_missing_order_fails() {
        let store = InMemoryStore::new();
        let order = order_for(&[1]);

        let err = match store.begin_attempt(&payment_for(&order)).await {
            Err(err) => err,
            Ok(_) => panic!("missing order should not take a payment"),
        };
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn locked_payment_commit_updates_both_rows() {
        let store = InMemoryStore::new();
        let order = order_for(&[1]);
        store.insert_order(order.clone()).await;
        let attempt = store.begin_attempt(&payment_for(&order)).await.unwrap();
        let payment = attempt.commit("cs_1").await.unwrap();

        let locked = store
            .lock_for_reconciliation(payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(locked.order_status(), Some(OrderStatus::Pending));
        locked
            .commit(&PaymentChanges {
                payment_status: Some(PaymentStatus::Successful),
                payment_intent_id: Some("pi_1".into()),
                order_status: Some(OrderStatus::Paid),
            })
            .await
            .unwrap();

        let payment = store
            .find_by_external_reference("pi_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Successful);
        let order = OrderRepository::find_by_id(&store, order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }
}
