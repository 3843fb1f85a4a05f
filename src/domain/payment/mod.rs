//! Payment module - payment attempts, processor events and reconciliation.

mod aggregate;
mod errors;
mod payment_event;
mod price_drift;
pub mod reconciliation;
mod status;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use aggregate::{Payment, PaymentLine};
pub use errors::PaymentError;
pub use payment_event::{PaymentEvent, PaymentEventKind};
pub use price_drift::{price_attempt, PriceDrift, PriceDriftPolicy, PricedAttempt, PricedLine};
pub use reconciliation::{IntegrityWarning, PaymentChanges, Reconciliation};
pub use status::PaymentStatus;
pub use stripe_event::{StripeEvent, StripeEventData};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{
    sign, signature_header, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS,
};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
