//! Payment HTTP endpoints and the Stripe webhook receiver.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    PaymentLineResponse, PaymentPageResponse, PaymentResponse, RefundResponse, WebhookAckResponse,
};
pub use handlers::STRIPE_SIGNATURE_HEADER;
pub use routes::{payment_routes, webhook_routes};
