//! Order handlers.
//!
//! ## Commands
//! - Checkout (cart to pending order)
//! - User cancellation of a pending order
//!
//! ## Queries
//! - Single order (owner or admin)
//! - The caller's orders
//! - All orders with filters (admin)

mod cancel_order;
mod create_order_from_cart;
mod get_order;
mod list_all_orders;
mod list_orders;

// Commands
pub use cancel_order::{CancelOrderCommand, CancelOrderHandler, CancelOrderResult};
pub use create_order_from_cart::{
    CreateOrderFromCartCommand, CreateOrderFromCartHandler, CreateOrderFromCartResult,
};

// Queries
pub use get_order::{GetOrderHandler, GetOrderQuery, GetOrderResult};
pub use list_all_orders::{ListAllOrdersHandler, ListAllOrdersQuery, ListAllOrdersResult};
pub use list_orders::{ListOrdersHandler, ListOrdersQuery, ListOrdersResult};
