//! Payment handlers.
//!
//! ## Commands
//! - Starting a payment attempt for a pending order
//! - Reconciling Stripe webhook events
//! - Refunding a successful payment (admin)
//!
//! ## Queries
//! - Single payment (owner or admin)
//! - The caller's payment history
//! - All payments with filters (admin)
//! - Payment statistics (admin)

mod gateway_call;
mod get_payment;
mod handle_payment_webhook;
mod initiate_payment;
mod list_all_payments;
mod payment_history;
mod payment_statistics;
mod refund_payment;

// Commands
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
    WebhookSettings,
};
pub use initiate_payment::{
    CheckoutSettings, InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
    SESSION_ID_PLACEHOLDER,
};
pub use refund_payment::{
    RefundPaymentCommand, RefundPaymentHandler, RefundPaymentResult, RefundSettings,
};

// Queries
pub use get_payment::{GetPaymentHandler, GetPaymentQuery, GetPaymentResult};
pub use list_all_payments::{ListAllPaymentsHandler, ListAllPaymentsQuery, ListAllPaymentsResult};
pub use payment_history::{
    PaymentHistoryHandler, PaymentHistoryQuery, PaymentHistoryResult, MAX_PAGE_SIZE,
};
pub use payment_statistics::{
    PaymentStatisticsHandler, PaymentStatisticsQuery, PaymentStatisticsResult,
};
