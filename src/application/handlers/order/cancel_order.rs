//! CancelOrderHandler - Command handler for user-initiated cancellation.
//!
//! Only pending orders can be canceled by their owner. A paid order moves to
//! canceled only through refund reconciliation.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, OwnedByUser, UserId};
use crate::domain::order::{Order, OrderError};
use crate::ports::OrderRepository;

#[derive(Debug, Clone)]
pub struct CancelOrderCommand {
    pub order_id: OrderId,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct CancelOrderResult {
    pub order: Order,
}

pub struct CancelOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl CancelOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, cmd: CancelOrderCommand) -> Result<CancelOrderResult, OrderError> {
        // 1. Lock the row so a concurrent webhook cannot interleave
        let lock = self
            .orders
            .lock_for_update(cmd.order_id)
            .await?
            .ok_or_else(|| OrderError::not_found_or_unauthorized(cmd.order_id))?;

        // 2. Foreign orders look missing
        if !lock.order().is_owner(&cmd.user_id) {
            return Err(OrderError::not_found_or_unauthorized(cmd.order_id));
        }

        // 3. Transition against the locked status
        let mut order = lock.order().clone();
        order.cancel()?;
        lock.commit_status(order.status).await?;

        tracing::info!(order_id = %order.id, user_id = %cmd.user_id, "Order canceled");

        Ok(CancelOrderResult { order })
    }
}
