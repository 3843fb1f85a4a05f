//! Stripe webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"`, compared in constant time,
//! with a timestamp window against replays.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Default maximum age for webhook events.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Every `v1` entry; Stripe sends several while a secret is being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses `t=<timestamp>,v1=<signature>[,v1=...][,v0=...]`.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                // v0 and unknown schemes are never trusted
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::ParseError("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies the signature, then parses the envelope.
    ///
    /// Nothing in the payload is looked at before the signature matches.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = sign(
            self.secret.expose_secret().as_bytes(),
            header.timestamp,
            payload,
        )?;

        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        let raw: serde_json::Value =
            serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let mut event: StripeEvent = serde_json::from_value(raw.clone())
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        event.raw = raw;
        Ok(event)
    }

    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let age = chrono::Utc::now().timestamp() - timestamp;

        if age > self.tolerance_secs {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }
}

/// HMAC-SHA256 of `"{timestamp}.{payload}"` as Stripe computes it.
pub fn sign(secret: &[u8], timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| WebhookError::ParseError(format!("invalid signing key: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Builds a `Stripe-Signature` header value for `payload`.
pub fn signature_header(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, WebhookError> {
    let signature = sign(secret.as_bytes(), timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    const PAYLOAD: &str = r#"{"id":"evt_test123","type":"checkout.session.completed","created":1704067200,"data":{"object":{"id":"cs_1"}},"livemode":false}"#;

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_collects_every_v1_signature() {
        let header = format!("t=1234567890,v1={},v1={}", "a".repeat(64), "b".repeat(64));

        let parsed = SignatureHeader::parse(&header).unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.v1_signatures.len(), 2);
    }

    #[test]
    fn parse_header_ignores_v0_and_unknown_fields() {
        let header = format!(
            "t=1234567890,v1={},v0={},scheme=hmac",
            "a".repeat(64),
            "b".repeat(64)
        );

        let parsed = SignatureHeader::parse(&header).unwrap();

        assert_eq!(parsed.v1_signatures.len(), 1);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_no_equals_fails() {
        let result = SignatureHeader::parse("t1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let header = signature_header(TEST_SECRET, now(), PAYLOAD.as_bytes()).unwrap();

        let event = verifier()
            .verify_and_parse(PAYLOAD.as_bytes(), &header)
            .unwrap();

        assert_eq!(event.id, "evt_test123");
        assert_eq!(event.event_type, "checkout.session.completed");
    }

    #[test]
    fn verified_event_keeps_delivered_payload() {
        let payload = r#"{"id":"evt_1","type":"charge.refunded","created":1704067200,"data":{"object":{"id":"ch_1"}},"request":{"id":"req_9"}}"#;
        let header = signature_header(TEST_SECRET, now(), payload.as_bytes()).unwrap();

        let event = verifier()
            .verify_and_parse(payload.as_bytes(), &header)
            .unwrap();

        assert_eq!(event.raw["request"]["id"], "req_9");
        assert_eq!(event.raw["data"]["object"]["id"], "ch_1");
    }

    #[test]
    fn verify_accepts_when_any_v1_matches() {
        let ts = now();
        let good = hex::encode(sign(TEST_SECRET.as_bytes(), ts, PAYLOAD.as_bytes()).unwrap());
        let header = format!("t={},v1={},v1={}", ts, "a".repeat(64), good);

        assert!(verifier().verify_and_parse(PAYLOAD.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let header = signature_header("whsec_other", now(), PAYLOAD.as_bytes()).unwrap();

        let result = verifier().verify_and_parse(PAYLOAD.as_bytes(), &header);

        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let header = signature_header(TEST_SECRET, now(), PAYLOAD.as_bytes()).unwrap();
        let tampered = PAYLOAD.replace("evt_test123", "evt_hacked");

        let result = verifier().verify_and_parse(tampered.as_bytes(), &header);

        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
    }

    #[test]
    fn signature_is_checked_before_json_parsing() {
        let payload = "not valid json";
        let header = format!("t={},v1={}", now(), "a".repeat(64));

        let result = verifier().verify_and_parse(payload.as_bytes(), &header);

        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
    }

    #[test]
    fn verify_invalid_json_with_valid_signature_is_parse_error() {
        let payload = "not valid json";
        let header = signature_header(TEST_SECRET, now(), payload.as_bytes()).unwrap();

        let result = verifier().verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_within_tolerance_succeeds() {
        assert!(verifier().validate_timestamp(now() - 120).is_ok());
    }

    #[test]
    fn timestamp_too_old_fails() {
        assert_eq!(
            verifier().validate_timestamp(now() - 600),
            Err(WebhookError::TimestampOutOfRange)
        );
    }

    #[test]
    fn custom_tolerance_is_honored() {
        let verifier = verifier().with_tolerance(900);
        assert!(verifier.validate_timestamp(now() - 600).is_ok());
    }

    #[test]
    fn timestamp_from_future_beyond_skew_fails() {
        assert_eq!(
            verifier().validate_timestamp(now() + 120),
            Err(WebhookError::InvalidTimestamp)
        );
    }

    #[test]
    fn timestamp_from_future_within_skew_succeeds() {
        assert!(verifier().validate_timestamp(now() + 30).is_ok());
    }

    // ══════════════════════════════════════════════════════════════
    // Constant Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_handles_lengths() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
    }
}
