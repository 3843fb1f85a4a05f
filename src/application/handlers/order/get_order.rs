//! GetOrderHandler - Query handler for a single order.

use std::sync::Arc;

use crate::domain::foundation::{Actor, OrderId, OwnedByUser};
use crate::domain::order::{Order, OrderError};
use crate::ports::OrderRepository;

#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub order_id: OrderId,
    pub actor: Actor,
}

#[derive(Debug, Clone)]
pub struct GetOrderResult {
    pub order: Order,
}

/// Returns the order to its owner or an administrator.
pub struct GetOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, query: GetOrderQuery) -> Result<GetOrderResult, OrderError> {
        let order = self
            .orders
            .find_by_id(query.order_id)
            .await?
            .filter(|order| order.is_visible_to(&query.actor))
            .ok_or_else(|| OrderError::not_found_or_unauthorized(query.order_id))?;

        Ok(GetOrderResult { order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{Money, MovieId, UserId};
    use crate::domain::order::{CheckoutPlan, PlannedLine};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn setup() -> (OrderId, GetOrderHandler) {
        let plan = CheckoutPlan {
            lines: vec![PlannedLine {
                movie_id: MovieId::new(7).unwrap(),
                price: Money::from_minor_units(1299).unwrap(),
            }],
            excluded: vec![],
        };
        let order = Order::place(user("owner"), &plan).unwrap();
        let id = order.id;
        let store = Arc::new(InMemoryStore::new());
        store.insert_order(order).await;
        (id, GetOrderHandler::new(store))
    }

    #[tokio::test]
    async fn owner_sees_order() {
        let (order_id, handler) = setup().await;

        let result = handler
            .handle(GetOrderQuery {
                order_id,
                actor: Actor::customer(user("owner")),
            })
            .await
            .unwrap();

        assert_eq!(result.order.id, order_id);
    }

    #[tokio::test]
    async fn admin_sees_any_order() {
        let (order_id, handler) = setup().await;

        let result = handler
            .handle(GetOrderQuery {
                order_id,
                actor: Actor::admin(user("ops")),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn other_customer_gets_not_found() {
        let (order_id, handler) = setup().await;

        let err = handler
            .handle(GetOrderQuery {
                order_id,
                actor: Actor::customer(user("stranger")),
            })
            .await
            .unwrap_err();

        assert_eq!(err, OrderError::NotFoundOrUnauthorized(order_id));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (_, handler) = setup().await;
        let missing = OrderId::new();

        let err = handler
            .handle(GetOrderQuery {
                order_id: missing,
                actor: Actor::admin(user("ops")),
            })
            .await
            .unwrap_err();

        assert_eq!(err, OrderError::NotFoundOrUnauthorized(missing));
    }
}
