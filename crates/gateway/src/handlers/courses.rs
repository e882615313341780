//! Course handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::auth::CurrentUser;
use crate::middleware::tenant::TenantContext;
use crate::AppState;
use coursehub_common::{
    auth::{authorize, enforce_tenant_match, Role},
    db::models::Course,
    errors::{AppError, Result},
    Repository,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Price in cents; stored exactly as sent, 0 means not purchasable
    #[serde(default)]
    #[validate(range(min = 0))]
    pub price_cents: i64,

    pub instructor_id: Option<i64>,
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Serialize)]
pub struct CourseResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub currency: String,
    pub price_cents: i64,
    pub instructor_id: Option<i64>,
    pub tenant_id: i64,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            is_published: course.is_published,
            currency: course.currency,
            price_cents: course.price_cents,
            instructor_id: course.instructor_id,
            tenant_id: course.tenant_id,
        }
    }
}

/// List courses: tenant-filtered when a tenant is resolved, global otherwise
pub async fn list_courses(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<CourseResponse>>> {
    let repo = Repository::new(state.db.clone());
    let courses = repo.list_courses(tenant.resolved()).await?;
    Ok(Json(courses.into_iter().map(Into::into).collect()))
}

/// Create a course in the caller's tenant (admin or instructor only)
pub async fn create_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    tenant: TenantContext,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>)> {
    authorize(&user, &[Role::Admin, Role::Instructor])?;
    enforce_tenant_match(&user, tenant.resolved())?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    let course = repo
        .create_course(
            user.tenant_id,
            request.title,
            request.description,
            request.currency,
            request.price_cents,
            request.instructor_id,
        )
        .await?;

    tracing::info!(
        course_id = course.id,
        tenant_id = course.tenant_id,
        price_cents = course.price_cents,
        "Course created"
    );

    Ok((StatusCode::CREATED, Json(course.into())))
}
