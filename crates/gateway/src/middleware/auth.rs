//! Authenticated-user extraction
//!
//! Validates the bearer token and resolves it to a live user row. Token
//! validation is pure; only the user lookup touches the database.

use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use coursehub_common::{
    auth::{extract_bearer, TokenPurpose},
    db::models::User,
    errors::AppError,
    metrics, Repository,
};

/// Extractor yielding the authenticated user behind the bearer token.
///
/// Fails `Unauthorized` when the token is missing, invalid, expired, or
/// when the subject no longer exists.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                metrics::record_auth_failure("missing_header");
                AppError::Unauthorized {
                    message: "Missing Authorization header".to_string(),
                }
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| {
            metrics::record_auth_failure("not_bearer");
            AppError::Unauthorized {
                message: "Expected a bearer token".to_string(),
            }
        })?;

        let claims = state
            .tokens
            .validate_purpose(token, TokenPurpose::Access)
            .inspect_err(|_| metrics::record_auth_failure("invalid_token"))?;

        let user_id = claims.subject_id()?;

        let user = Repository::new(state.db.clone())
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                metrics::record_auth_failure("unknown_subject");
                AppError::Unauthorized {
                    message: "User no longer exists".to_string(),
                }
            })?;

        Ok(CurrentUser(user))
    }
}
