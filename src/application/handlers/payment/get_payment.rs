//! GetPaymentHandler - Query handler for a single payment.

use std::sync::Arc;

use crate::domain::foundation::{Actor, OwnedByUser, PaymentId};
use crate::domain::payment::{Payment, PaymentError};
use crate::ports::PaymentRepository;

#[derive(Debug, Clone)]
pub struct GetPaymentQuery {
    pub payment_id: PaymentId,
    pub actor: Actor,
}

#[derive(Debug, Clone)]
pub struct GetPaymentResult {
    pub payment: Payment,
}

/// Returns the payment to its owner or an administrator.
pub struct GetPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl GetPaymentHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn handle(&self, query: GetPaymentQuery) -> Result<GetPaymentResult, PaymentError> {
        let payment = self
            .payments
            .find_by_id(query.payment_id)
            .await?
            .filter(|payment| payment.is_visible_to(&query.actor))
            .ok_or_else(|| PaymentError::not_found(query.payment_id))?;

        Ok(GetPaymentResult { payment })
    }
}
