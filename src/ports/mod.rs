//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `CartRepository` - Per-user cart lines
//! - `OrderRepository` - Orders, checkout transaction, order row locks
//! - `PaymentRepository` - Payment attempts and reconciliation locks
//! - `WebhookEventRepository` - Stripe webhook idempotency tracking
//!
//! ## External Collaborators
//!
//! - `CatalogLookup` - Movie name and current price
//! - `PaymentGateway` - Hosted checkout sessions and refunds

mod cart_repository;
mod catalog;
mod order_repository;
mod payment_gateway;
mod payment_repository;
mod webhook_event_repository;

pub use cart_repository::CartRepository;
pub use catalog::{CatalogLookup, MovieListing};
pub use order_repository::{OrderFilter, OrderLock, OrderRepository};
pub use payment_gateway::{
    CheckoutLineItem, CheckoutSession, CreateCheckoutSessionRequest, GatewayError,
    GatewayErrorCode, PaymentGateway, RefundReceipt, RefundRequest, RefundStatus,
};
pub use payment_repository::{
    LockedPayment, PaymentAttempt, PaymentFilter, PaymentPage, PaymentRepository,
    PaymentStatistics,
};
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};
