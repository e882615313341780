//! Payment handlers
//!
//! Checkout creates a pending payment correlated to a hosted provider
//! session; the webhook endpoint moves payment state. Webhook bodies are
//! signature-verified before any state logic runs.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::middleware::auth::CurrentUser;
use crate::middleware::tenant::TenantContext;
use crate::AppState;
use coursehub_common::{
    auth::{authorize, enforce_tenant_match, Role},
    db::models::Payment,
    errors::{AppError, Result},
    payments::{webhook, CheckoutRequest},
    Repository,
};

/// Provider signature header on webhook deliveries
const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub course_id: i64,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: i64,
    pub tenant_id: i64,
    pub user_id: Option<i64>,
    pub course_id: Option<i64>,
    pub provider: String,
    pub provider_payment_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            tenant_id: payment.tenant_id,
            user_id: payment.user_id,
            course_id: payment.course_id,
            provider: payment.provider,
            provider_payment_id: payment.provider_payment_id,
            amount_cents: payment.amount_cents,
            currency: payment.currency,
            status: payment.status,
        }
    }
}

/// Start a checkout for a course in the caller's tenant
pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    tenant: TenantContext,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutResponse>> {
    enforce_tenant_match(&user, tenant.resolved())?;

    let repo = Repository::new(state.db.clone());

    // Tenant-filtered lookup: a cross-tenant course reads as absent
    let course = repo
        .find_course_in_tenant(body.course_id, user.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource_type: "course".to_string(),
            id: body.course_id.to_string(),
        })?;

    if !course.is_purchasable() {
        return Err(AppError::NotPurchasable);
    }

    let provider = state
        .provider
        .as_ref()
        .ok_or_else(|| AppError::Configuration {
            message: "Payment provider not configured".to_string(),
        })?;

    let session = provider
        .create_checkout_session(&CheckoutRequest {
            course_title: course.title.clone(),
            currency: course.currency.clone(),
            amount_cents: course.price_cents,
            tenant_id: user.tenant_id,
            user_id: user.id,
            course_id: course.id,
        })
        .await?;

    let payment = repo
        .create_pending_payment(user.tenant_id, user.id, &course, session.id)
        .await?;

    tracing::info!(
        payment_id = payment.id,
        tenant_id = payment.tenant_id,
        course_id = course.id,
        provider_payment_id = %payment.provider_payment_id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        checkout_url: session.url,
    }))
}

/// Receive a provider webhook event.
///
/// Acknowledges receipt for every verified event, including ones that
/// resolve to no-ops; the provider redelivers anything not acknowledged.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>> {
    let secret = state
        .config
        .payments
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration {
            message: "Webhook secret not configured".to_string(),
        })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::InvalidWebhookSignature {
            message: "Missing signature header".to_string(),
        })?;

    webhook::verify_signature(
        body.as_bytes(),
        signature,
        secret,
        state.config.payments.webhook_tolerance_secs,
    )?;

    let event = webhook::WebhookEvent::from_payload(body.as_bytes())?;

    Repository::new(state.db.clone())
        .apply_webhook_event(&event.event_type, &event.data.object.id)
        .await?;

    Ok(Json(json!({ "received": true })))
}

/// List the caller's own payments in their tenant
pub async fn list_my_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    tenant: TenantContext,
) -> Result<Json<Vec<PaymentResponse>>> {
    enforce_tenant_match(&user, tenant.resolved())?;

    let repo = Repository::new(state.db.clone());
    let payments = repo.list_user_payments(user.tenant_id, user.id).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// List every payment in the tenant (admin or instructor only)
pub async fn list_tenant_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    tenant: TenantContext,
) -> Result<Json<Vec<PaymentResponse>>> {
    authorize(&user, &[Role::Admin, Role::Instructor])?;
    enforce_tenant_match(&user, tenant.resolved())?;

    let repo = Repository::new(state.db.clone());
    let payments = repo.list_tenant_payments(user.tenant_id).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}
