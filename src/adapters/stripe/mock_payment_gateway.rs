//! Mock payment gateway for testing.
//!
//! Configurable stand-in for Stripe used by unit and integration tests:
//! - Deterministic session ids (`cs_mock_1`, `cs_mock_2`, ...)
//! - Error injection per operation
//! - Artificial latency for timeout tests
//! - Request capture for assertions

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    CheckoutSession, CreateCheckoutSessionRequest, GatewayError, PaymentGateway, RefundReceipt,
    RefundRequest, RefundStatus,
};

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.fail_sessions_with(GatewayError::network("connection reset"));
/// ```
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    session_counter: u32,
    refund_counter: u32,

    /// Session id -> payment intent id.
    intents: HashMap<String, String>,

    /// Give new sessions a payment intent immediately.
    intent_on_create: bool,

    session_error: Option<GatewayError>,
    refund_error: Option<GatewayError>,
    refund_status: Option<RefundStatus>,

    delay: Option<Duration>,

    checkout_requests: Vec<CreateCheckoutSessionRequest>,
    refund_requests: Vec<RefundRequest>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// New sessions carry a payment intent (`pi_mock_N`) right away.
    pub fn with_intent_on_create(self) -> Self {
        self.state().intent_on_create = true;
        self
    }

    /// Every session creation fails with `error` until cleared.
    pub fn fail_sessions_with(&self, error: GatewayError) {
        self.state().session_error = Some(error);
    }

    /// Every refund fails with `error` until cleared.
    pub fn fail_refunds_with(&self, error: GatewayError) {
        self.state().refund_error = Some(error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.session_error = None;
        state.refund_error = None;
    }

    /// Status reported for refunds (default `succeeded`).
    pub fn set_refund_status(&self, status: RefundStatus) {
        self.state().refund_status = Some(status);
    }

    /// Delay every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Registers the payment intent that a session resolves to.
    pub fn set_payment_intent(&self, session_id: impl Into<String>, intent_id: impl Into<String>) {
        self.state()
            .intents
            .insert(session_id.into(), intent_id.into());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertions
    // ════════════════════════════════════════════════════════════════════════════

    pub fn checkout_requests(&self) -> Vec<CreateCheckoutSessionRequest> {
        self.state().checkout_requests.clone()
    }

    pub fn refund_requests(&self) -> Vec<RefundRequest> {
        self.state().refund_requests.clone()
    }

    async fn pause(&self) {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        self.pause().await;

        let mut state = self.state();
        state.checkout_requests.push(request);
        if let Some(error) = state.session_error.clone() {
            return Err(error);
        }

        state.session_counter += 1;
        let id = format!("cs_mock_{}", state.session_counter);
        let payment_intent_id = if state.intent_on_create {
            let intent = format!("pi_mock_{}", state.session_counter);
            state.intents.insert(id.clone(), intent.clone());
            Some(intent)
        } else {
            None
        };

        Ok(CheckoutSession {
            url: format!("https://checkout.mock/pay/{}", id),
            id,
            payment_intent_id,
        })
    }

    async fn resolve_payment_intent(
        &self,
        session_id: &str,
    ) -> Result<Option<String>, GatewayError> {
        self.pause().await;
        Ok(self.state().intents.get(session_id).cloned())
    }

    async fn create_refund(&self, request: RefundRequest) -> Result<RefundReceipt, GatewayError> {
        self.pause().await;

        let mut state = self.state();
        state.refund_requests.push(request);
        if let Some(error) = state.refund_error.clone() {
            return Err(error);
        }

        state.refund_counter += 1;
        Ok(RefundReceipt {
            id: format!("re_mock_{}", state.refund_counter),
            status: state.refund_status.clone().unwrap_or(RefundStatus::Succeeded),
        })
    }
}
