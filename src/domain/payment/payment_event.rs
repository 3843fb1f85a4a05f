//! Closed set of payment events this service reacts to.

use serde::Deserialize;

use super::{PaymentStatus, StripeEvent, WebhookError};

/// Decoded processor event, keyed by the reference used to find the payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// `checkout.session.completed`
    SessionCompleted {
        session_id: String,
        payment_intent_id: Option<String>,
        /// False when the session completed without collecting money yet.
        paid: bool,
    },
    /// `checkout.session.expired`
    SessionExpired { session_id: String },
    /// `payment_intent.succeeded`
    PaymentSucceeded { payment_intent_id: String },
    /// `payment_intent.payment_failed`
    PaymentFailed { payment_intent_id: String },
    /// `charge.refunded` or `refund.created`
    Refunded { payment_intent_id: String },
}

impl PaymentEventKind {
    /// Session or intent id identifying the payment.
    pub fn external_reference(&self) -> &str {
        match self {
            PaymentEventKind::SessionCompleted { session_id, .. }
            | PaymentEventKind::SessionExpired { session_id } => session_id,
            PaymentEventKind::PaymentSucceeded { payment_intent_id }
            | PaymentEventKind::PaymentFailed { payment_intent_id }
            | PaymentEventKind::Refunded { payment_intent_id } => payment_intent_id,
        }
    }

    /// Intent id carried by the event, if any.
    pub fn payment_intent_id(&self) -> Option<&str> {
        match self {
            PaymentEventKind::SessionCompleted {
                payment_intent_id, ..
            } => payment_intent_id.as_deref(),
            PaymentEventKind::SessionExpired { .. } => None,
            PaymentEventKind::PaymentSucceeded { payment_intent_id }
            | PaymentEventKind::PaymentFailed { payment_intent_id }
            | PaymentEventKind::Refunded { payment_intent_id } => Some(payment_intent_id),
        }
    }

    /// Payment status the event implies; `None` when it only carries data.
    pub fn target_status(&self) -> Option<PaymentStatus> {
        match self {
            PaymentEventKind::SessionCompleted { paid: true, .. }
            | PaymentEventKind::PaymentSucceeded { .. } => Some(PaymentStatus::Successful),
            PaymentEventKind::SessionCompleted { paid: false, .. } => None,
            PaymentEventKind::SessionExpired { .. } => Some(PaymentStatus::Expired),
            PaymentEventKind::PaymentFailed { .. } => Some(PaymentStatus::Canceled),
            PaymentEventKind::Refunded { .. } => Some(PaymentStatus::Refunded),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaymentEventKind::SessionCompleted { .. } => "session_completed",
            PaymentEventKind::SessionExpired { .. } => "session_expired",
            PaymentEventKind::PaymentSucceeded { .. } => "payment_succeeded",
            PaymentEventKind::PaymentFailed { .. } => "payment_failed",
            PaymentEventKind::Refunded { .. } => "refunded",
        }
    }
}

/// A verified event with its processor id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_id: String,
    pub kind: PaymentEventKind,
}

#[derive(Deserialize)]
struct SessionObject {
    id: Option<String>,
    payment_intent: Option<String>,
    payment_status: Option<String>,
}

#[derive(Deserialize)]
struct IntentObject {
    id: Option<String>,
}

#[derive(Deserialize)]
struct RefundSource {
    payment_intent: Option<String>,
}

impl PaymentEvent {
    /// Decodes a verified envelope.
    ///
    /// Types outside the closed set fail with `UnsupportedEvent`, which the
    /// webhook endpoint acknowledges.
    pub fn decode(event: &StripeEvent) -> Result<Self, WebhookError> {
        let kind = match event.event_type.as_str() {
            "checkout.session.completed" => {
                let session: SessionObject = object(event)?;
                PaymentEventKind::SessionCompleted {
                    session_id: session.id.ok_or(WebhookError::MissingField("id"))?,
                    payment_intent_id: session.payment_intent,
                    paid: session.payment_status.as_deref() == Some("paid"),
                }
            }
            "checkout.session.expired" => {
                let session: SessionObject = object(event)?;
                PaymentEventKind::SessionExpired {
                    session_id: session.id.ok_or(WebhookError::MissingField("id"))?,
                }
            }
            "payment_intent.succeeded" => {
                let intent: IntentObject = object(event)?;
                PaymentEventKind::PaymentSucceeded {
                    payment_intent_id: intent.id.ok_or(WebhookError::MissingField("id"))?,
                }
            }
            "payment_intent.payment_failed" => {
                let intent: IntentObject = object(event)?;
                PaymentEventKind::PaymentFailed {
                    payment_intent_id: intent.id.ok_or(WebhookError::MissingField("id"))?,
                }
            }
            "charge.refunded" | "refund.created" => {
                let source: RefundSource = object(event)?;
                PaymentEventKind::Refunded {
                    payment_intent_id: source
                        .payment_intent
                        .ok_or(WebhookError::MissingField("payment_intent"))?,
                }
            }
            other => return Err(WebhookError::UnsupportedEvent(other.to_string())),
        };

        Ok(Self {
            event_id: event.id.clone(),
            kind,
        })
    }
}

fn object<T: serde::de::DeserializeOwned>(event: &StripeEvent) -> Result<T, WebhookError> {
    event
        .deserialize_object()
        .map_err(|e| WebhookError::ParseError(e.to_string()))
}
