//! Stripe webhook event envelope.
//!
//! Only the envelope is typed here; [`super::PaymentEvent`] decodes the
//! object for the event kinds this service consumes.

use serde::{Deserialize, Serialize};

/// Stripe webhook event (envelope only).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,

    /// The payload as delivered; filled in by the verifier.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (shape depends on the type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Deserializes the data object as `T`.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
            raw: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope_without_api_version() {
        let json = r#"{
            "id": "evt_1",
            "type": "charge.refunded",
            "created": 1704067200,
            "data": {"object": {"id": "ch_1", "payment_intent": "pi_1"}}
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "charge.refunded");
        assert!(event.api_version.is_none());
        assert!(!event.is_live());
    }

    #[test]
    fn deserialize_object_reads_typed_fields() {
        #[derive(Deserialize)]
        struct Charge {
            payment_intent: String,
        }

        let event = StripeEventBuilder::new()
            .event_type("charge.refunded")
            .object(serde_json::json!({"id": "ch_1", "payment_intent": "pi_9"}))
            .build();

        let charge: Charge = event.deserialize_object().unwrap();
        assert_eq!(charge.payment_intent, "pi_9");
    }
}
