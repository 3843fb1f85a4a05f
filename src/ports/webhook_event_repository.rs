//! WebhookEventRepository port - processed Stripe event ids.
//!
//! Stripe may deliver the same event more than once (timeouts, 5xx from our
//! endpoint, lost acknowledgements). Recording the event id lets a redelivery
//! be acknowledged without reapplying it. Only events that were applied or
//! deliberately ignored are recorded; a failed attempt leaves no record so the
//! retry is processed again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// How a recorded event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Success,
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Success => "success",
            WebhookOutcome::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(WebhookOutcome::Success),
            "ignored" => Some(WebhookOutcome::Ignored),
            _ => None,
        }
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    pub event_type: String,

    pub processed_at: DateTime<Utc>,

    pub outcome: WebhookOutcome,

    /// Why the event was ignored.
    pub note: Option<String>,

    /// Original event payload for debugging.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: WebhookOutcome::Success,
            note: None,
            payload,
        }
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: WebhookOutcome::Ignored,
            note: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    Inserted,
    /// Another delivery recorded the same event first.
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations should key on the event id (primary key, `ON CONFLICT DO
/// NOTHING`) so concurrent deliveries cannot both insert.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_event_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn WebhookEventRepository) {}
    }

    #[test]
    fn success_record_has_no_note() {
        let record = WebhookEventRecord::success(
            "evt_123",
            "checkout.session.completed",
            serde_json::json!({"id": "test"}),
        );

        assert_eq!(record.event_id, "evt_123");
        assert_eq!(record.outcome, WebhookOutcome::Success);
        assert!(record.note.is_none());
    }

    #[test]
    fn ignored_record_includes_reason() {
        let record = WebhookEventRecord::ignored(
            "evt_456",
            "customer.created",
            "unsupported event type",
            serde_json::json!({}),
        );

        assert_eq!(record.outcome, WebhookOutcome::Ignored);
        assert_eq!(record.note.as_deref(), Some("unsupported event type"));
    }

    #[test]
    fn outcome_tokens_parse_back() {
        for outcome in [WebhookOutcome::Success, WebhookOutcome::Ignored] {
            assert_eq!(WebhookOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(WebhookOutcome::parse("failed"), None);
    }
}
