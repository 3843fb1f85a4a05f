//! Reconciliation planning.
//!
//! Given the locked payment, its order status and a decoded event, decide what
//! to write. Decisions come from the persisted state only, never from event
//! order, so duplicates and late arrivals settle to the same result.

use crate::domain::foundation::StateMachine;
use crate::domain::order::OrderStatus;

use super::{Payment, PaymentEventKind, PaymentStatus};

/// Writes to apply inside the reconciliation transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentChanges {
    pub payment_status: Option<PaymentStatus>,
    pub payment_intent_id: Option<String>,
    pub order_status: Option<OrderStatus>,
}

impl PaymentChanges {
    pub fn is_empty(&self) -> bool {
        self.payment_status.is_none()
            && self.payment_intent_id.is_none()
            && self.order_status.is_none()
    }
}

/// Conditions worth a warning that must not fail the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// The payment's order no longer exists.
    OrderMissing,
    /// Money arrived for an order the user already canceled.
    PaidForCanceledOrder,
    /// A refund arrived for an order that was never marked paid.
    RefundForUnpaidOrder(OrderStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Something to write.
    Apply {
        changes: PaymentChanges,
        warnings: Vec<IntegrityWarning>,
    },
    /// The payment already reflects the event.
    AlreadyApplied,
    /// The current status cannot accept the event (out of order or superseded).
    Stale {
        current: PaymentStatus,
        target: PaymentStatus,
    },
}

/// Plans the effect of `event` on `payment` and its order.
///
/// `order_status` is `None` when the order row is gone; the payment is still
/// updated and a warning is raised.
pub fn plan(
    event: &PaymentEventKind,
    payment: &Payment,
    order_status: Option<OrderStatus>,
) -> Reconciliation {
    let new_intent = event
        .payment_intent_id()
        .filter(|_| payment.external_payment_id.is_none())
        .map(str::to_string);

    let target = match event.target_status() {
        Some(target) if target != payment.status => target,
        _ => {
            return match new_intent {
                Some(intent) => Reconciliation::Apply {
                    changes: PaymentChanges {
                        payment_intent_id: Some(intent),
                        ..Default::default()
                    },
                    warnings: vec![],
                },
                None => Reconciliation::AlreadyApplied,
            };
        }
    };

    if !payment.status.can_transition_to(&target) {
        return Reconciliation::Stale {
            current: payment.status,
            target,
        };
    }

    let mut warnings = Vec::new();
    let order_target = match (target, order_status) {
        (_, None) => {
            warnings.push(IntegrityWarning::OrderMissing);
            None
        }
        (PaymentStatus::Successful, Some(OrderStatus::Pending)) => Some(OrderStatus::Paid),
        (PaymentStatus::Successful, Some(OrderStatus::Canceled)) => {
            warnings.push(IntegrityWarning::PaidForCanceledOrder);
            None
        }
        (PaymentStatus::Refunded, Some(OrderStatus::Paid)) => Some(OrderStatus::Canceled),
        (PaymentStatus::Refunded, Some(OrderStatus::Pending)) => {
            warnings.push(IntegrityWarning::RefundForUnpaidOrder(OrderStatus::Pending));
            None
        }
        // Expiry and failure leave the order pending so the user can retry.
        _ => None,
    };

    Reconciliation::Apply {
        changes: PaymentChanges {
            payment_status: Some(target),
            payment_intent_id: new_intent,
            order_status: order_target,
        },
        warnings,
    }
}
