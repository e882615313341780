//! Payment provider abstraction
//!
//! Provides a unified interface to the external card-payment provider:
//! - Hosted checkout session creation (Stripe)
//! - Webhook signature verification and event payloads ([`webhook`])
//!
//! The provider is consumed as a black box: this module only creates
//! checkout sessions and hands back the session id/url. Payment state
//! lives in the database and moves via verified webhook events.

pub mod webhook;

use crate::config::PaymentsConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// A hosted checkout session created at the provider
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Provider session id; correlates the eventual webhook event back to
    /// our payment row
    pub id: String,

    /// Hosted payment page the client is redirected to
    pub url: String,
}

/// Everything the provider needs to build a checkout session
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub course_title: String,
    pub currency: String,
    pub amount_cents: i64,
    pub tenant_id: i64,
    pub user_id: i64,
    pub course_id: i64,
}

/// Trait for creating checkout sessions at a payment provider
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;

    /// Get the provider name as stored on payment rows
    fn provider_name(&self) -> &str;
}

/// Stripe checkout client
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
    success_url: String,
    cancel_url: String,
}

impl StripeClient {
    /// Create a new Stripe client from the payments configuration
    pub fn new(config: &PaymentsConfig) -> Result<Self> {
        let secret_key = config
            .secret_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "Payment provider secret key not configured".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            secret_key,
            api_base: config.api_base.clone(),
            success_url: config.checkout_success_url.clone(),
            cancel_url: config.checkout_cancel_url.clone(),
        })
    }

    /// Build the form-encoded checkout session body.
    ///
    /// Tenant, user, and course ids travel as opaque correlation metadata;
    /// the provider never interprets them.
    fn session_form(&self, request: &CheckoutRequest) -> Vec<(String, String)> {
        vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.course_title.clone(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "metadata[tenant_id]".to_string(),
                request.tenant_id.to_string(),
            ),
            ("metadata[user_id]".to_string(), request.user_id.to_string()),
            (
                "metadata[course_id]".to_string(),
                request.course_id.to_string(),
            ),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ]
    }

    /// Make the session request with bounded retry on transient failures
    async fn request_with_retry(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let max_retries = 3;
        let mut last_error = None;

        for attempt in 0..max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * (2_u64.pow(attempt as u32)));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(request).await {
                Ok(session) => return Ok(session),
                // Client errors will not improve on retry
                Err(e @ AppError::Internal { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries,
                        error = %e,
                        "Checkout session request failed, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::UpstreamUnavailable {
            service: "stripe".to_string(),
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&self.session_form(request))
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable {
                service: "stripe".to_string(),
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_client_error() {
                return Err(AppError::Internal {
                    message: format!("Payment provider rejected request {}: {}", status, body),
                });
            }
            return Err(AppError::UpstreamUnavailable {
                service: "stripe".to_string(),
                message: format!("API error {}: {}", status, body),
            });
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::UpstreamUnavailable {
                service: "stripe".to_string(),
                message: format!("Failed to parse response: {}", e),
            })
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        self.request_with_retry(request).await
    }

    fn provider_name(&self) -> &str {
        "stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn client() -> StripeClient {
        let mut config = AppConfig::default().payments;
        config.secret_key = Some("sk_test_123".to_string());
        StripeClient::new(&config).unwrap()
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            course_title: "Intro to Testing".to_string(),
            currency: "usd".to_string(),
            amount_cents: 2000,
            tenant_id: 1,
            user_id: 2,
            course_id: 3,
        }
    }

    #[test]
    fn test_missing_secret_key_rejected() {
        let config = AppConfig::default().payments;
        assert!(StripeClient::new(&config).is_err());
    }

    #[test]
    fn test_session_form_carries_correlation_metadata() {
        let form = client().session_form(&request());

        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("2000"));
        assert_eq!(get("metadata[tenant_id]"), Some("1"));
        assert_eq!(get("metadata[user_id]"), Some("2"));
        assert_eq!(get("metadata[course_id]"), Some("3"));
        assert!(get("success_url").is_some());
        assert!(get("cancel_url").is_some());
    }

    #[test]
    fn test_amount_passed_through_unscaled() {
        // Cents in, cents out: no unit conversion anywhere in the client
        let form = client().session_form(&request());
        let amount = form
            .iter()
            .find(|(k, _)| k == "line_items[0][price_data][unit_amount]")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(amount, "2000");
    }
}
