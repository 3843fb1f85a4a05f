//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresCartRepository` - Carts and cart lines
//! - `PostgresOrderRepository` - Orders, checkout transaction, order row locks
//! - `PostgresPaymentRepository` - Payment attempts, reconciliation locks, reports
//! - `PostgresCatalog` - Read-only movie lookup
//! - `PostgresWebhookEventRepository` - Processed Stripe event ids
//!
//! Schema lives in `migrations/`.

mod cart_repository;
mod catalog;
mod common;
mod order_repository;
mod payment_repository;
mod webhook_event_repository;

pub use cart_repository::PostgresCartRepository;
pub use catalog::PostgresCatalog;
pub use order_repository::PostgresOrderRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
