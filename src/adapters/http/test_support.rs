//! Router wiring over the in-memory adapters, shared by the route tests.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use crate::adapters::memory::{InMemoryCatalog, InMemoryStore, InMemoryWebhookEventRepository};
use crate::adapters::stripe::MockPaymentGateway;
use crate::application::handlers::payment::{
    CheckoutSettings, HandlePaymentWebhookHandler, RefundSettings, WebhookSettings,
};
use crate::domain::foundation::{Money, MovieId};
use crate::domain::payment::{signature_header, StripeWebhookVerifier};

use super::{router, AppState, USER_ID_HEADER, USER_ROLE_HEADER};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub catalog: Arc<InMemoryCatalog>,
    pub gateway: MockPaymentGateway,
    pub events: Arc<InMemoryWebhookEventRepository>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let gateway = MockPaymentGateway::new();
        let events = Arc::new(InMemoryWebhookEventRepository::new());

        let webhooks = HandlePaymentWebhookHandler::new(
            StripeWebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string())),
            store.clone(),
            events.clone(),
            WebhookSettings {
                lookup_attempts: 1,
                lookup_retry_delay: Duration::from_millis(1),
            },
        );

        let state = AppState {
            carts: store.clone(),
            orders: store.clone(),
            payments: store.clone(),
            catalog: catalog.clone(),
            gateway: Arc::new(gateway.clone()),
            checkout: CheckoutSettings::default(),
            refunds: RefundSettings::default(),
            webhooks: Arc::new(webhooks),
        };

        Self {
            store,
            catalog,
            gateway,
            events,
            router: router(state),
        }
    }

    pub async fn with_movie(self, id: i64, name: &str, price: Decimal) -> Self {
        self.catalog
            .insert(
                MovieId::new(id).unwrap(),
                name,
                Money::from_decimal(price).unwrap(),
            )
            .await;
        self
    }

    /// Sends a request as `user` (customer role unless `role` is given).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((user_id, role)) = user {
            builder = builder
                .header(USER_ID_HEADER, user_id)
                .header(USER_ROLE_HEADER, role);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn customer(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, Some(("user-1", "customer")), body).await
    }

    pub async fn admin(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        self.send(method, uri, Some(("admin-1", "admin")), None).await
    }

    /// Posts a Stripe event; `signed` controls whether a valid signature is attached.
    pub async fn webhook(
        &self,
        event_id: &str,
        event_type: &str,
        object: Value,
        signed: bool,
    ) -> (StatusCode, Value) {
        let now = chrono::Utc::now().timestamp();
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": event_id,
            "type": event_type,
            "created": now,
            "data": { "object": object },
        }))
        .unwrap();

        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhooks/stripe")
            .header("content-type", "application/json");
        if signed {
            builder = builder.header(
                "Stripe-Signature",
                signature_header(WEBHOOK_SECRET, now, &payload).unwrap(),
            );
        }
        let request = builder.body(Body::from(payload)).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}
