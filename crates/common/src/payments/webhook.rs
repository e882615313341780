//! Webhook signature verification and event payloads
//!
//! Inbound webhook deliveries carry a signature header of the form
//! `t=<unix-seconds>,v1=<hex-hmac>[,v1=...]` where the MAC is
//! HMAC-SHA256 over `"{t}.{raw body}"`. Verification must happen before
//! any payment-state logic runs; unverified bodies are never trusted.

use crate::db::models::PaymentStatus;
use crate::errors::{AppError, Result};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// A parsed webhook event; only the event type and the correlation
/// session id are consumed.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookObject {
    /// The provider checkout session id
    pub id: String,
}

impl WebhookEvent {
    /// Parse a verified webhook body
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|_| AppError::Validation {
            message: "Invalid webhook payload".to_string(),
            field: None,
        })
    }
}

/// The payment status a webhook event type drives toward, if any.
///
/// Legality of the transition is still checked against the current
/// status; an event landing on the wrong state is ignored.
// TODO: map the provider's refund events (charge.refunded) once the
// handler resolves charges back to their checkout session id.
pub fn target_status_for_event(event_type: &str) -> Option<PaymentStatus> {
    match event_type {
        "checkout.session.completed" => Some(PaymentStatus::Paid),
        "checkout.session.expired" => Some(PaymentStatus::Failed),
        _ => None,
    }
}

/// Verify a webhook signature header against the raw request body
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: u64,
) -> Result<()> {
    verify_signature_at(
        payload,
        signature_header,
        secret,
        tolerance_secs,
        Utc::now().timestamp(),
    )
}

/// Signature verification with an explicit clock, for testability
fn verify_signature_at(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> Result<()> {
    let (timestamp, candidates) = parse_signature_header(signature_header)?;

    if (now - timestamp).unsigned_abs() > tolerance_secs {
        return Err(AppError::InvalidWebhookSignature {
            message: "Timestamp outside tolerance".to_string(),
        });
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        AppError::Configuration {
            message: "Invalid webhook secret".to_string(),
        }
    })?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice is constant-time; any listed v1 value may match
    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        if mac.clone().verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::InvalidWebhookSignature {
        message: "No matching signature".to_string(),
    })
}

/// Split `t=...,v1=...` into the timestamp and the signature candidates
fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>)> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| AppError::InvalidWebhookSignature {
        message: "Missing timestamp".to_string(),
    })?;

    if candidates.is_empty() {
        return Err(AppError::InvalidWebhookSignature {
            message: "Missing signature".to_string(),
        });
    }

    Ok((timestamp, candidates))
}

/// Sign a payload the way the provider does.
///
/// Used by tests and local tooling to fabricate valid deliveries.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const PAYLOAD: &[u8] =
        br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_test_1"}}}"#;

    #[test]
    fn test_valid_signature_accepted() {
        let now = 1_700_000_000;
        let header = sign_payload(PAYLOAD, SECRET, now);
        assert!(verify_signature_at(PAYLOAD, &header, SECRET, 300, now).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let now = 1_700_000_000;
        let header = sign_payload(PAYLOAD, SECRET, now);
        let tampered = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_test_2"}}}"#;
        assert!(matches!(
            verify_signature_at(tampered, &header, SECRET, 300, now),
            Err(AppError::InvalidWebhookSignature { .. })
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = 1_700_000_000;
        let header = sign_payload(PAYLOAD, "whsec_other", now);
        assert!(matches!(
            verify_signature_at(PAYLOAD, &header, SECRET, 300, now),
            Err(AppError::InvalidWebhookSignature { .. })
        ));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let signed_at = 1_700_000_000;
        let header = sign_payload(PAYLOAD, SECRET, signed_at);
        let now = signed_at + 301;
        assert!(matches!(
            verify_signature_at(PAYLOAD, &header, SECRET, 300, now),
            Err(AppError::InvalidWebhookSignature { .. })
        ));
    }

    #[test]
    fn test_malformed_header_rejected() {
        for header in ["", "t=abc", "v1=deadbeef", "t=123"] {
            assert!(verify_signature_at(PAYLOAD, header, SECRET, 300, 123).is_err());
        }
    }

    #[test]
    fn test_any_listed_signature_may_match() {
        let now = 1_700_000_000;
        let good = sign_payload(PAYLOAD, SECRET, now);
        let v1 = good.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1=deadbeef,v1={}", now, v1);
        assert!(verify_signature_at(PAYLOAD, &header, SECRET, 300, now).is_ok());
    }

    #[test]
    fn test_event_parse() {
        let event = WebhookEvent::from_payload(PAYLOAD).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object.id, "cs_test_1");
    }

    #[test]
    fn test_event_parse_rejects_garbage() {
        assert!(WebhookEvent::from_payload(b"not json").is_err());
    }

    #[test]
    fn test_event_target_statuses() {
        assert_eq!(
            target_status_for_event("checkout.session.completed"),
            Some(PaymentStatus::Paid)
        );
        assert_eq!(
            target_status_for_event("checkout.session.expired"),
            Some(PaymentStatus::Failed)
        );
        assert_eq!(target_status_for_event("invoice.created"), None);
    }
}
