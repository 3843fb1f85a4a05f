//! ListAllOrdersHandler - Admin query over every order.

use std::sync::Arc;

use crate::domain::order::{Order, OrderError};
use crate::ports::{OrderFilter, OrderRepository};

#[derive(Debug, Clone, Default)]
pub struct ListAllOrdersQuery {
    pub filter: OrderFilter,
}

#[derive(Debug, Clone)]
pub struct ListAllOrdersResult {
    pub orders: Vec<Order>,
}

pub struct ListAllOrdersHandler {
    orders: Arc<dyn OrderRepository>,
}

impl ListAllOrdersHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(
        &self,
        query: ListAllOrdersQuery,
    ) -> Result<ListAllOrdersResult, OrderError> {
        let orders = self.orders.list(&query.filter).await?;
        Ok(ListAllOrdersResult { orders })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{Money, MovieId, UserId};
    use crate::domain::order::{CheckoutPlan, OrderStatus, PlannedLine};

    fn order_for(user: &str) -> Order {
        let plan = CheckoutPlan {
            lines: vec![PlannedLine {
                movie_id: MovieId::new(1).unwrap(),
                price: Money::from_minor_units(500).unwrap(),
            }],
            excluded: vec![],
        };
        Order::place(UserId::new(user).unwrap(), &plan).unwrap()
    }

    #[tokio::test]
    async fn filters_by_status() {
        let store = Arc::new(InMemoryStore::new());
        let mut paid = order_for("alice");
        paid.apply_status(OrderStatus::Paid).unwrap();
        store.insert_order(paid).await;
        store.insert_order(order_for("bob")).await;
        let handler = ListAllOrdersHandler::new(store);

        let all = handler.handle(ListAllOrdersQuery::default()).await.unwrap();
        let paid_only = handler
            .handle(ListAllOrdersQuery {
                filter: OrderFilter {
                    status: Some(OrderStatus::Paid),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(all.orders.len(), 2);
        assert_eq!(paid_only.orders.len(), 1);
        assert_eq!(paid_only.orders[0].user_id.as_str(), "alice");
    }
}
