//! Organization (tenant) handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::AppState;
use coursehub_common::{
    db::models::Organization,
    errors::{AppError, Result},
    Repository,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 200), custom(function = "validate_slug"))]
    pub slug: String,
}

#[derive(Serialize)]
pub struct OrganizationResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<Organization> for OrganizationResponse {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            name: org.name,
            slug: org.slug,
        }
    }
}

/// Slugs are URL path segments; only lowercase alphanumerics and dashes
fn validate_slug(slug: &str) -> std::result::Result<(), ValidationError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

/// Create a new organization (public signup)
pub async fn create_organization(
    State(state): State<AppState>,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    // Pre-check for a friendlier error; the unique constraints are the backstop
    if repo
        .find_organization_by_name_or_slug(&request.name, &request.slug)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict {
            message: "Organization already exists".to_string(),
        });
    }

    let org = repo.create_organization(request.name, request.slug).await?;

    tracing::info!(org_id = org.id, slug = %org.slug, "Organization created");

    Ok((StatusCode::CREATED, Json(org.into())))
}

/// Get an organization by slug
pub async fn get_organization(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<OrganizationResponse>> {
    let repo = Repository::new(state.db.clone());

    let org = repo
        .find_organization_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource_type: "organization".to_string(),
            id: slug,
        })?;

    Ok(Json(org.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("acme").is_ok());
        assert!(validate_slug("acme-labs-2").is_ok());
        assert!(validate_slug("Acme").is_err());
        assert!(validate_slug("acme labs").is_err());
        assert!(validate_slug("acme/labs").is_err());
    }
}
