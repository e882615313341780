//! Authentication handlers
//!
//! Register, login, token refresh, and profile reads. Login failures never
//! reveal whether the email exists.

use axum::{extract::State, http::StatusCode, Form, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::auth::CurrentUser;
use crate::AppState;
use coursehub_common::{
    auth::{password, Role},
    errors::{AppError, Result},
    metrics, Repository,
};

/// Token pair returned by every credential-issuing endpoint
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Authenticated user profile
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub tenant_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 255))]
    pub full_name: String,

    #[serde(default)]
    pub role: Role,

    pub tenant_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant style form body
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register a new user in an existing organization
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    // The tenant must exist before anyone can join it
    if repo
        .find_organization_by_id(request.tenant_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation {
            message: "Invalid tenant id".to_string(),
            field: Some("tenant_id".to_string()),
        });
    }

    // Pre-check for a friendlier error; the unique constraint is the backstop
    if repo.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::Conflict {
            message: "Email already registered".to_string(),
        });
    }

    let password_hash = password::hash_password(&request.password)?;

    let user = repo
        .create_user(
            request.email,
            request.full_name,
            request.role,
            password_hash,
            request.tenant_id,
        )
        .await?;

    tracing::info!(user_id = user.id, tenant_id = user.tenant_id, "User registered");

    let (access, refresh) = state.tokens.issue_pair(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse::bearer(access, refresh)),
    ))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    issue_for_credentials(&state, &request.email, &request.password).await
}

/// OAuth2 password-grant compatible token endpoint
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>> {
    issue_for_credentials(&state, &form.username, &form.password).await
}

async fn issue_for_credentials(
    state: &AppState,
    email: &str,
    password_input: &str,
) -> Result<Json<TokenResponse>> {
    let repo = Repository::new(state.db.clone());

    let user = repo.find_user_by_email(email).await?;

    // Same failure for unknown email and wrong password
    let authenticated = user
        .filter(|user| password::verify_password(password_input, &user.password_hash));

    let Some(user) = authenticated else {
        metrics::record_auth_failure("bad_credentials");
        return Err(AppError::Unauthorized {
            message: "Invalid credentials".to_string(),
        });
    };

    let (access, refresh) = state.tokens.issue_pair(user.id)?;
    Ok(Json(TokenResponse::bearer(access, refresh)))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    let (access, refresh) = state.tokens.refresh(&request.refresh_token)?;
    Ok(Json(TokenResponse::bearer(access, refresh)))
}

/// Get the authenticated user's profile
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        tenant_id: user.tenant_id,
    })
}

/// Get detailed user profile information
pub async fn profile(current_user: CurrentUser) -> Json<UserResponse> {
    me(current_user).await
}
