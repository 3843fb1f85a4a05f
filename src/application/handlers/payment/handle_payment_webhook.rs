//! HandlePaymentWebhookHandler - Command handler for Stripe webhook events.
//!
//! Flow: verify the signature, drop redeliveries of recorded event ids, decode
//! into the closed event set, find the payment, lock it with its order, plan
//! from the locked state, commit, record the event id.
//!
//! Every outcome that should not be redelivered returns `Ok`; only storage
//! failures surface as retryable errors, and those leave no event record.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{DomainError, PaymentId};
use crate::domain::payment::{
    reconciliation, IntegrityWarning, Payment, PaymentEvent, PaymentEventKind, PaymentStatus,
    Reconciliation, StripeWebhookVerifier, WebhookError,
};
use crate::ports::{PaymentRepository, WebhookEventRecord, WebhookEventRepository};

/// Payment lookup tuning.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Lookups before giving up on an unknown reference (at least one).
    pub lookup_attempts: u32,
    pub lookup_retry_delay: Duration,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            lookup_attempts: 3,
            lookup_retry_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentWebhookResult {
    /// State changed.
    Applied {
        payment_id: PaymentId,
        event: &'static str,
    },
    /// The payment already reflected the event.
    AlreadyApplied { payment_id: PaymentId },
    /// The event id was processed before.
    Duplicate,
    /// The payment's status cannot accept the event.
    Stale {
        payment_id: PaymentId,
        current: PaymentStatus,
        target: PaymentStatus,
    },
    /// No payment carries the event's reference.
    PaymentNotFound { reference: String },
    /// Event type outside the consumed set.
    Ignored { event_type: String },
}

pub struct HandlePaymentWebhookHandler {
    verifier: StripeWebhookVerifier,
    payments: Arc<dyn PaymentRepository>,
    events: Arc<dyn WebhookEventRepository>,
    settings: WebhookSettings,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        payments: Arc<dyn PaymentRepository>,
        events: Arc<dyn WebhookEventRepository>,
        settings: WebhookSettings,
    ) -> Self {
        Self {
            verifier,
            payments,
            events,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        // 1. Nothing is read from the body before the signature checks out
        let mut event = self
            .verifier
            .verify_and_parse(&cmd.payload, &cmd.signature)
            .map_err(|err| {
                tracing::warn!(error = %err, "Webhook verification failed");
                err
            })?;
        let raw = std::mem::take(&mut event.raw);

        // 2. Redelivery of a recorded event
        if self
            .events
            .find_by_event_id(&event.id)
            .await
            .map_err(storage)?
            .is_some()
        {
            tracing::info!(event_id = %event.id, event_type = %event.event_type, "Duplicate webhook event");
            return Ok(HandlePaymentWebhookResult::Duplicate);
        }

        // 3. Decode into the closed set
        let decoded = match PaymentEvent::decode(&event) {
            Ok(decoded) => decoded,
            Err(WebhookError::UnsupportedEvent(event_type)) => {
                tracing::warn!(event_id = %event.id, event_type = %event_type, "Unsupported webhook event type");
                self.record(WebhookEventRecord::ignored(
                    &event.id,
                    &event.event_type,
                    "unsupported event type",
                    raw,
                ))
                .await;
                return Ok(HandlePaymentWebhookResult::Ignored { event_type });
            }
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "Malformed webhook event");
                return Err(err);
            }
        };
        let kind = &decoded.kind;

        // 4. Find the payment; the session id may not be committed yet
        let Some(found) = self.find_payment(kind).await? else {
            tracing::warn!(
                event_id = %event.id,
                event = kind.name(),
                reference = kind.external_reference(),
                "Webhook references an unknown payment"
            );
            self.record(WebhookEventRecord::ignored(
                &event.id,
                &event.event_type,
                "payment not found",
                raw,
            ))
            .await;
            return Ok(HandlePaymentWebhookResult::PaymentNotFound {
                reference: kind.external_reference().to_string(),
            });
        };

        // 5. Lock payment and order, decide from the locked state
        let Some(locked) = self
            .payments
            .lock_for_reconciliation(found.id)
            .await
            .map_err(storage)?
        else {
            return Err(WebhookError::Database(format!(
                "payment {} vanished during reconciliation",
                found.id
            )));
        };
        let payment_id = locked.payment().id;

        let result = match reconciliation::plan(kind, locked.payment(), locked.order_status()) {
            Reconciliation::Apply { changes, warnings } => {
                for warning in &warnings {
                    log_integrity_warning(&event.id, locked.payment(), warning);
                }
                locked.commit(&changes).await.map_err(storage)?;
                tracing::info!(
                    event_id = %event.id,
                    event = kind.name(),
                    payment_id = %payment_id,
                    payment_status = ?changes.payment_status,
                    order_status = ?changes.order_status,
                    "Webhook event applied"
                );
                HandlePaymentWebhookResult::Applied {
                    payment_id,
                    event: kind.name(),
                }
            }
            Reconciliation::AlreadyApplied => {
                drop(locked);
                tracing::info!(event_id = %event.id, payment_id = %payment_id, "Webhook event already reflected");
                HandlePaymentWebhookResult::AlreadyApplied { payment_id }
            }
            Reconciliation::Stale { current, target } => {
                drop(locked);
                tracing::warn!(
                    event_id = %event.id,
                    event = kind.name(),
                    payment_id = %payment_id,
                    current = %current,
                    target = %target,
                    "Out-of-order webhook event ignored"
                );
                HandlePaymentWebhookResult::Stale {
                    payment_id,
                    current,
                    target,
                }
            }
        };

        // 6. Record the event id; the state change is already durable
        let record = match &result {
            HandlePaymentWebhookResult::Stale { current, .. } => WebhookEventRecord::ignored(
                &event.id,
                &event.event_type,
                format!("stale for payment status {}", current),
                raw,
            ),
            _ => WebhookEventRecord::success(&event.id, &event.event_type, raw),
        };
        self.record(record).await;

        Ok(result)
    }

    async fn find_payment(&self, kind: &PaymentEventKind) -> Result<Option<Payment>, WebhookError> {
        let primary = kind.external_reference();
        let mut references = vec![primary];
        if let Some(intent) = kind.payment_intent_id().filter(|intent| *intent != primary) {
            references.push(intent);
        }

        let attempts = self.settings.lookup_attempts.max(1);
        for attempt in 1..=attempts {
            for reference in &references {
                if let Some(payment) = self
                    .payments
                    .find_by_external_reference(reference)
                    .await
                    .map_err(storage)?
                {
                    return Ok(Some(payment));
                }
            }
            if attempt < attempts {
                tracing::debug!(reference = primary, attempt, "Payment not found yet, retrying");
                tokio::time::sleep(self.settings.lookup_retry_delay).await;
            }
        }
        Ok(None)
    }

    /// Stores the event id; a failure only costs idempotency on redelivery.
    async fn record(&self, record: WebhookEventRecord) {
        let event_id = record.event_id.clone();
        if let Err(err) = self.events.save(record).await {
            tracing::error!(event_id = %event_id, error = %err, "Failed to record processed webhook event");
        }
    }
}

fn storage(err: DomainError) -> WebhookError {
    WebhookError::Database(err.to_string())
}

fn log_integrity_warning(event_id: &str, payment: &Payment, warning: &IntegrityWarning) {
    match warning {
        IntegrityWarning::OrderMissing => tracing::warn!(
            event_id,
            payment_id = %payment.id,
            order_id = %payment.order_id,
            "Webhook payment references a missing order"
        ),
        IntegrityWarning::PaidForCanceledOrder => tracing::warn!(
            event_id,
            payment_id = %payment.id,
            order_id = %payment.order_id,
            "Payment succeeded for an order that was already canceled"
        ),
        IntegrityWarning::RefundForUnpaidOrder(status) => tracing::warn!(
            event_id,
            payment_id = %payment.id,
            order_id = %payment.order_id,
            order_status = %status,
            "Refund received for an order that was never paid"
        ),
    }
}
