//! Stripe webhook processing configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::handlers::payment::WebhookSettings;
use crate::domain::payment::DEFAULT_TOLERANCE_SECS;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Maximum age of a signed event, in seconds
    #[serde(default = "default_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Payment lookups before an event is declared orphaned
    #[serde(default = "default_lookup_attempts")]
    pub lookup_attempts: u32,

    #[serde(default = "default_lookup_retry_delay")]
    pub lookup_retry_delay_ms: u64,
}

impl WebhookConfig {
    pub fn settings(&self) -> WebhookSettings {
        WebhookSettings {
            lookup_attempts: self.lookup_attempts,
            lookup_retry_delay: Duration::from_millis(self.lookup_retry_delay_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.signature_tolerance_secs <= 0 {
            return Err(ValidationError::InvalidSignatureTolerance);
        }
        if !(1..=10).contains(&self.lookup_attempts) {
            return Err(ValidationError::InvalidLookupAttempts);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signature_tolerance_secs: default_tolerance(),
            lookup_attempts: default_lookup_attempts(),
            lookup_retry_delay_ms: default_lookup_retry_delay(),
        }
    }
}

fn default_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_lookup_attempts() -> u32 {
    3
}

fn default_lookup_retry_delay() -> u64 {
    1000
}
