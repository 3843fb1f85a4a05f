//! HTTP DTOs for order endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Money;
use crate::domain::order::{ExcludedLine, Order, OrderLine};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineResponse {
    pub id: String,
    pub movie_id: i64,
    pub price_at_order: Money,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            id: line.id.to_string(),
            movie_id: line.movie_id.value(),
            price_at_order: line.price_at_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub total_amount: Money,
    pub lines: Vec<OrderLineResponse>,
    pub created_at: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            status: order.status.as_str().to_string(),
            total_amount: order.total_amount,
            lines: order.lines.iter().map(OrderLineResponse::from).collect(),
            created_at: order.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedLineResponse {
    pub movie_id: i64,
    pub reason: String,
}

impl From<&ExcludedLine> for ExcludedLineResponse {
    fn from(line: &ExcludedLine) -> Self {
        Self {
            movie_id: line.movie_id.value(),
            reason: line.reason.as_str().to_string(),
        }
    }
}

/// Checkout result: the new order and the cart lines left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order: OrderResponse,
    pub excluded: Vec<ExcludedLineResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
}

impl From<&[Order]> for OrderListResponse {
    fn from(orders: &[Order]) -> Self {
        Self {
            orders: orders.iter().map(OrderResponse::from).collect(),
        }
    }
}

/// Where to send the user to pay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayOrderResponse {
    pub payment_id: String,
    pub amount: Money,
    pub checkout_url: String,
}
