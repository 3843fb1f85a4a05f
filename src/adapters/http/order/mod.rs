//! Order HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CheckoutResponse, ExcludedLineResponse, OrderLineResponse, OrderListResponse, OrderResponse,
    PayOrderResponse,
};
pub use routes::order_routes;
