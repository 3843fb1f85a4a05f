//! RefundPaymentHandler - Admin command for refunding a successful payment.
//!
//! The gateway is called before any lock is taken. By default the refund
//! webhook applies the state change; `mark_refunded_on_accept` applies it
//! right away through the same reconciliation planner, so the later webhook
//! finds it already applied.
//!
//! Refund webhooks reference the payment intent. An intent resolved from the
//! checkout session is stored on the payment before the refund is requested.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::PaymentId;
use crate::domain::payment::{
    reconciliation, Payment, PaymentChanges, PaymentError, PaymentEventKind, Reconciliation,
};
use crate::ports::{PaymentGateway, PaymentRepository, RefundReceipt, RefundRequest};

use super::gateway_call::bounded;

#[derive(Debug, Clone)]
pub struct RefundSettings {
    pub gateway_timeout: Duration,
    pub mark_refunded_on_accept: bool,
}

impl Default for RefundSettings {
    fn default() -> Self {
        Self {
            gateway_timeout: Duration::from_secs(10),
            mark_refunded_on_accept: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone)]
pub struct RefundPaymentResult {
    /// Payment as stored after the call.
    pub payment: Payment,
    pub refund: RefundReceipt,
}

pub struct RefundPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: RefundSettings,
}

impl RefundPaymentHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: RefundSettings,
    ) -> Self {
        Self {
            payments,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: RefundPaymentCommand,
    ) -> Result<RefundPaymentResult, PaymentError> {
        // 1. Only successful payments
        let payment = self
            .payments
            .find_by_id(cmd.payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(cmd.payment_id))?;
        payment.ensure_refundable()?;

        // 2. Refunds target the payment intent
        let payment_intent_id = self.payment_intent_for(&payment).await?;

        // 3. Ask the processor
        let refund = bounded(
            self.settings.gateway_timeout,
            self.gateway.create_refund(RefundRequest {
                payment_intent_id: payment_intent_id.clone(),
                idempotency_key: format!("refund-{}", payment.id),
            }),
        )
        .await?;

        if !refund.accepted() {
            tracing::warn!(
                payment_id = %payment.id,
                refund_id = %refund.id,
                status = ?refund.status,
                "Refund not accepted by the processor"
            );
            return Err(PaymentError::gateway_rejected(format!(
                "refund {} was not accepted (status {:?})",
                refund.id, refund.status
            )));
        }

        tracing::info!(
            payment_id = %payment.id,
            refund_id = %refund.id,
            amount = %payment.amount,
            "Refund accepted"
        );

        // 4. Optionally reflect it now instead of waiting for the webhook
        if self.settings.mark_refunded_on_accept {
            self.mark_refunded(payment.id, payment_intent_id).await?;
        }

        let payment = self
            .payments
            .find_by_id(payment.id)
            .await?
            .unwrap_or(payment);

        Ok(RefundPaymentResult { payment, refund })
    }

    async fn payment_intent_for(&self, payment: &Payment) -> Result<String, PaymentError> {
        if let Some(intent) = &payment.external_payment_id {
            return Ok(intent.clone());
        }

        let Some(session_id) = &payment.external_session_id else {
            return Err(PaymentError::gateway_rejected(
                "payment has no processor reference to refund",
            ));
        };

        let intent = bounded(
            self.settings.gateway_timeout,
            self.gateway.resolve_payment_intent(session_id),
        )
        .await?
        .ok_or_else(|| {
            PaymentError::gateway_rejected(format!(
                "checkout session {} has no payment intent",
                session_id
            ))
        })?;

        self.record_intent(payment.id, &intent).await?;
        Ok(intent)
    }

    async fn record_intent(&self, payment_id: PaymentId, intent: &str) -> Result<(), PaymentError> {
        let Some(locked) = self.payments.lock_for_reconciliation(payment_id).await? else {
            return Err(PaymentError::not_found(payment_id));
        };
        if locked.payment().external_payment_id.is_some() {
            return Ok(());
        }

        locked
            .commit(&PaymentChanges {
                payment_intent_id: Some(intent.to_string()),
                ..Default::default()
            })
            .await?;

        tracing::info!(
            payment_id = %payment_id,
            payment_intent_id = intent,
            "Recorded payment intent resolved from the checkout session"
        );
        Ok(())
    }

    async fn mark_refunded(
        &self,
        payment_id: PaymentId,
        payment_intent_id: String,
    ) -> Result<(), PaymentError> {
        let Some(locked) = self.payments.lock_for_reconciliation(payment_id).await? else {
            return Err(PaymentError::not_found(payment_id));
        };

        let event = PaymentEventKind::Refunded { payment_intent_id };
        match reconciliation::plan(&event, locked.payment(), locked.order_status()) {
            Reconciliation::Apply { changes, .. } => locked.commit(&changes).await?,
            Reconciliation::AlreadyApplied => {}
            Reconciliation::Stale { current, .. } => {
                tracing::warn!(
                    payment_id = %payment_id,
                    current = %current,
                    "Payment changed before the refund could be applied"
                );
            }
        }
        Ok(())
    }
}
