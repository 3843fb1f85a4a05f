//! Order status state machine.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine, ValidationError};

/// Lifecycle status of an order.
///
/// ```text
/// PENDING ──(payment reconciled)──► PAID ──(refund reconciled)──► CANCELED
///    └────────(user cancel)──────────────────────────────────────► CANCELED
/// ```
///
/// A refund is the only way out of `Paid`; `Canceled` accepts nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Canceled,
}

impl OrderStatus {
    /// Stable storage token.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Why a payment cannot be opened in this status; `None` when pending.
    pub fn unpayable_reason(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Pending => None,
            OrderStatus::Paid => Some("order already paid"),
            OrderStatus::Canceled => Some("cannot pay for a canceled order"),
        }
    }

    /// `OrderNotPayable` unless pending; used by repositories under the order lock.
    pub fn ensure_payable(&self) -> Result<(), DomainError> {
        match self.unpayable_reason() {
            None => Ok(()),
            Some(reason) => Err(DomainError::new(ErrorCode::OrderNotPayable, reason)),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "canceled" => Ok(OrderStatus::Canceled),
            other => Err(ValidationError::invalid_format(
                "order_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for OrderStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Paid, Canceled],
            // Refund reconciliation only.
            Paid => vec![Canceled],
            Canceled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_transition_to_paid() {
        assert!(OrderStatus::Pending.can_transition_to(&OrderStatus::Paid));
    }

    #[test]
    fn pending_can_transition_to_canceled() {
        assert!(OrderStatus::Pending.can_transition_to(&OrderStatus::Canceled));
    }

    #[test]
    fn paid_cannot_return_to_pending() {
        assert!(!OrderStatus::Paid.can_transition_to(&OrderStatus::Pending));
    }

    #[test]
    fn canceled_is_terminal() {
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Canceled
            .transition_to(OrderStatus::Paid)
            .is_err());
    }

    #[test]
    fn only_pending_orders_are_payable() {
        assert_eq!(OrderStatus::Pending.unpayable_reason(), None);
        assert_eq!(OrderStatus::Paid.unpayable_reason(), Some("order already paid"));
        assert_eq!(
            OrderStatus::Canceled.unpayable_reason(),
            Some("cannot pay for a canceled order")
        );

        assert!(OrderStatus::Pending.ensure_payable().is_ok());
        let err = OrderStatus::Paid.ensure_payable().unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotPayable);
        assert_eq!(err.message, "order already paid");
    }

    #[test]
    fn tokens_round_trip() {
        for status in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Canceled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&OrderStatus::Paid).unwrap(), "\"paid\"");
    }
}
