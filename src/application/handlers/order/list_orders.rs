//! ListOrdersHandler - Query handler for the caller's orders, newest first.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::order::{Order, OrderError};
use crate::ports::OrderRepository;

#[derive(Debug, Clone)]
pub struct ListOrdersQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct ListOrdersResult {
    pub orders: Vec<Order>,
}

pub struct ListOrdersHandler {
    orders: Arc<dyn OrderRepository>,
}

impl ListOrdersHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, query: ListOrdersQuery) -> Result<ListOrdersResult, OrderError> {
        let orders = self.orders.list_for_user(&query.user_id).await?;
        Ok(ListOrdersResult { orders })
    }
}
