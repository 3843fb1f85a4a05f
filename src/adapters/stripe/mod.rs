//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for Stripe:
//! - Hosted Checkout Sessions for order payment
//! - Payment intent lookup for a session
//! - Full refunds
//!
//! Webhook signature verification and event decoding live in the payment
//! domain, since they decide what the service accepts rather than how it
//! talks to Stripe.
//!
//! # Configuration
//!
//! Required environment variables:
//! - `CINEMA_STORE__PAYMENT__STRIPE_API_KEY`: Stripe secret API key

mod api_types;
mod mock_payment_gateway;
mod stripe_adapter;

pub use api_types::{StripeCheckoutSession, StripeErrorBody, StripeErrorEnvelope, StripeRefund};
pub use mock_payment_gateway::MockPaymentGateway;
pub use stripe_adapter::{StripeConfig, StripeGateway};
