//! InitiatePaymentHandler - Command handler for starting a payment attempt.
//!
//! The payment row is written inside an open attempt that stays open across
//! the gateway call: a session is committed with its id, a failed or slow
//! gateway rolls the attempt back. The attempt also holds the one-pending-
//! payment-per-order guarantee, so two concurrent calls on the same order
//! produce one pending payment and one `AlreadyInProgress`. It also locks the
//! order, so a cancel or a success webhook landing after the first status
//! check turns into `OrderNotPayable` instead of a session for a closed order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{
    ErrorCode, Money, MovieId, OrderId, OwnedByUser, Timestamp, UserId,
};
use crate::domain::payment::{price_attempt, Payment, PaymentError, PriceDriftPolicy};
use crate::ports::{
    CatalogLookup, CheckoutLineItem, CreateCheckoutSessionRequest, MovieListing, OrderRepository,
    PaymentGateway, PaymentRepository,
};

use super::gateway_call::bounded;

/// Placeholder the processor replaces with the session id in redirect URLs.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Checkout session parameters taken from configuration.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub session_ttl_minutes: i64,
    pub gateway_timeout: Duration,
    pub price_drift_policy: PriceDriftPolicy,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            success_url: format!(
                "http://localhost:3000/payment/success?session_id={}",
                SESSION_ID_PLACEHOLDER
            ),
            cancel_url: format!(
                "http://localhost:3000/payment/cancel?session_id={}",
                SESSION_ID_PLACEHOLDER
            ),
            session_ttl_minutes: 30,
            gateway_timeout: Duration::from_secs(10),
            price_drift_policy: PriceDriftPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitiatePaymentCommand {
    pub order_id: OrderId,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct InitiatePaymentResult {
    pub payment: Payment,
    /// Hosted checkout page the user is redirected to.
    pub checkout_url: String,
}

pub struct InitiatePaymentHandler {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    catalog: Arc<dyn CatalogLookup>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl InitiatePaymentHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        catalog: Arc<dyn CatalogLookup>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            orders,
            payments,
            catalog,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: InitiatePaymentCommand,
    ) -> Result<InitiatePaymentResult, PaymentError> {
        // 1. Order must exist, belong to the caller and still be pending
        let order = self
            .orders
            .find_by_id(cmd.order_id)
            .await?
            .filter(|order| order.is_owner(&cmd.user_id))
            .ok_or_else(|| PaymentError::order_not_found_or_unauthorized(cmd.order_id))?;

        if let Some(reason) = order.status.unpayable_reason() {
            return Err(PaymentError::order_not_payable(order.id, reason));
        }

        // 2. Price the attempt against today's catalog
        let listings = self.catalog.get_movies(&order.movie_ids()).await?;
        let current_prices: HashMap<MovieId, Money> = listings
            .iter()
            .map(|(id, listing)| (*id, listing.price))
            .collect();
        let priced = price_attempt(&order, &current_prices, self.settings.price_drift_policy)?;

        for drift in &priced.drifts {
            tracing::warn!(
                order_id = %order.id,
                movie_id = %drift.movie_id,
                order_price = %drift.order_price,
                current_price = %drift.current_price,
                policy = ?self.settings.price_drift_policy,
                "Catalog price changed since checkout"
            );
        }
        if let Some(stored) = priced.stored_total_mismatch {
            tracing::warn!(
                order_id = %order.id,
                stored_total = %stored,
                charged_total = %priced.total(),
                "Order total differs from the sum of its lines; charging the line sum"
            );
        }

        // 3. Open the attempt; the order status is checked again under its lock
        let payment = Payment::start(cmd.user_id.clone(), order.id, &priced.lines);
        let attempt = self
            .payments
            .begin_attempt(&payment)
            .await
            .map_err(|err| match err.code {
                ErrorCode::OrderNotPayable => PaymentError::order_not_payable(order.id, err.message),
                _ => PaymentError::from(err),
            })?;

        // 4. Create the hosted session while the attempt is open
        let request = CreateCheckoutSessionRequest {
            order_id: order.id,
            payment_id: payment.id,
            user_id: cmd.user_id.clone(),
            line_items: priced
                .lines
                .iter()
                .map(|line| CheckoutLineItem {
                    name: line_item_name(&listings, line.movie_id),
                    unit_amount: line.price,
                    quantity: 1,
                })
                .collect(),
            currency: self.settings.currency.clone(),
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
            expires_at: Timestamp::now().plus_minutes(self.settings.session_ttl_minutes),
            idempotency_key: format!("checkout-{}", payment.id),
        };

        let session = match bounded(
            self.settings.gateway_timeout,
            self.gateway.create_checkout_session(request),
        )
        .await
        {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(
                    order_id = %order.id,
                    payment_id = %payment.id,
                    error = %err,
                    "Checkout session creation failed; rolling back payment attempt"
                );
                if let Err(rollback_err) = attempt.rollback().await {
                    tracing::error!(
                        payment_id = %payment.id,
                        error = %rollback_err,
                        "Failed to roll back payment attempt"
                    );
                }
                return Err(err.into());
            }
        };

        // 5. Commit with the session id
        let payment = attempt.commit(&session.id).await?;

        tracing::info!(
            order_id = %order.id,
            payment_id = %payment.id,
            session_id = %session.id,
            amount = %payment.amount,
            "Payment attempt started"
        );

        Ok(InitiatePaymentResult {
            payment,
            checkout_url: session.url,
        })
    }
}

fn line_item_name(listings: &HashMap<MovieId, MovieListing>, movie_id: MovieId) -> String {
    listings
        .get(&movie_id)
        .map(|listing| listing.name.clone())
        .unwrap_or_else(|| format!("Movie {}", movie_id))
}
