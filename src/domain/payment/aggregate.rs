//! Payment aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Money, OrderId, OrderLineId, OwnedByUser, PaymentId, PaymentLineId, StateMachine, Timestamp,
    UserId,
};

use super::{PaymentError, PaymentStatus, PricedLine};

/// One order line as charged by this attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub id: PaymentLineId,
    pub order_line_id: OrderLineId,
    pub price_at_payment: Money,
}

/// One attempt to collect money for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub amount: Money,
    /// Checkout session id, set once the gateway created the session.
    pub external_session_id: Option<String>,
    /// Payment intent id, known once the processor reports it.
    pub external_payment_id: Option<String>,
    pub lines: Vec<PaymentLine>,
    pub created_at: Timestamp,
}

impl Payment {
    /// Starts a pending attempt; the amount is the sum of the priced lines.
    pub fn start(user_id: UserId, order_id: OrderId, priced: &[PricedLine]) -> Self {
        let lines: Vec<PaymentLine> = priced
            .iter()
            .map(|p| PaymentLine {
                id: PaymentLineId::new(),
                order_line_id: p.order_line_id,
                price_at_payment: p.price,
            })
            .collect();

        Self {
            id: PaymentId::new(),
            user_id,
            order_id,
            status: PaymentStatus::Pending,
            amount: lines.iter().map(|l| l.price_at_payment).sum(),
            external_session_id: None,
            external_payment_id: None,
            lines,
            created_at: Timestamp::now(),
        }
    }

    pub fn attach_session(&mut self, session_id: impl Into<String>) {
        self.external_session_id = Some(session_id.into());
    }

    pub fn is_refundable(&self) -> bool {
        self.status == PaymentStatus::Successful
    }

    /// Fails with `NotRefundable` unless the payment succeeded.
    pub fn ensure_refundable(&self) -> Result<(), PaymentError> {
        if self.is_refundable() {
            Ok(())
        } else {
            Err(PaymentError::not_refundable(self.id, self.status))
        }
    }

    /// True when `reference` is this payment's session or intent id.
    pub fn matches_reference(&self, reference: &str) -> bool {
        self.external_session_id.as_deref() == Some(reference)
            || self.external_payment_id.as_deref() == Some(reference)
    }

    pub fn apply_status(&mut self, target: PaymentStatus) -> Result<(), PaymentError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|e| PaymentError::invalid_transition(e.from, e.to))?;
        Ok(())
    }
}

impl OwnedByUser for Payment {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::MovieId;
    use rust_decimal_macros::dec;

    fn priced(amount: rust_decimal::Decimal) -> PricedLine {
        PricedLine {
            order_line_id: OrderLineId::new(),
            movie_id: MovieId::new(7).unwrap(),
            price: Money::from_decimal(amount).unwrap(),
        }
    }

    fn payment() -> Payment {
        Payment::start(
            UserId::new("user-1").unwrap(),
            OrderId::new(),
            &[priced(dec!(12.99)), priced(dec!(1.01))],
        )
    }

    #[test]
    fn start_sums_line_prices() {
        let payment = payment();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount.amount(), dec!(14.00));
        assert_eq!(payment.lines.len(), 2);
        assert!(payment.external_session_id.is_none());
    }

    #[test]
    fn matches_session_or_intent_reference() {
        let mut payment = payment();
        payment.attach_session("cs_test_1");
        payment.external_payment_id = Some("pi_test_1".to_string());

        assert!(payment.matches_reference("cs_test_1"));
        assert!(payment.matches_reference("pi_test_1"));
        assert!(!payment.matches_reference("cs_other"));
    }

    #[test]
    fn pending_payment_is_not_refundable() {
        let payment = payment();
        assert!(matches!(
            payment.ensure_refundable(),
            Err(PaymentError::NotRefundable { .. })
        ));
    }

    #[test]
    fn successful_payment_is_refundable() {
        let mut payment = payment();
        payment.apply_status(PaymentStatus::Successful).unwrap();
        assert!(payment.ensure_refundable().is_ok());
    }

    #[test]
    fn expired_payment_cannot_succeed() {
        let mut payment = payment();
        payment.apply_status(PaymentStatus::Expired).unwrap();
        assert!(payment.apply_status(PaymentStatus::Successful).is_err());
        assert_eq!(payment.status, PaymentStatus::Expired);
    }
}
