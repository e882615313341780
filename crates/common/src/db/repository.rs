//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling. Every tenant-scoped query filters by
//! tenant id at the SQL level; callers never post-filter rows.

use crate::auth::{Role, TenantId};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::payments::webhook::target_status_for_event;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, QueryFilter, QueryOrder, Set, Statement,
};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Organization Operations
    // ========================================================================

    /// Create a new organization.
    ///
    /// Name and slug uniqueness is ultimately enforced by the datastore;
    /// a violation surfaces as `Conflict`.
    pub async fn create_organization(&self, name: String, slug: String) -> Result<Organization> {
        let now = chrono::Utc::now();

        let org = OrganizationActiveModel {
            name: Set(name),
            slug: Set(slug),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        org.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find organization by ID
    pub async fn find_organization_by_id(&self, id: i64) -> Result<Option<Organization>> {
        OrganizationEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find organization by slug
    pub async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::Slug.eq(slug))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find organization by name or slug (signup duplicate pre-check)
    pub async fn find_organization_by_name_or_slug(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<Option<Organization>> {
        OrganizationEntity::find()
            .filter(
                Condition::any()
                    .add(OrganizationColumn::Name.eq(name))
                    .add(OrganizationColumn::Slug.eq(slug)),
            )
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user in the given tenant
    pub async fn create_user(
        &self,
        email: String,
        full_name: String,
        role: Role,
        password_hash: String,
        tenant_id: TenantId,
    ) -> Result<User> {
        let now = chrono::Utc::now();

        let user = UserActiveModel {
            email: Set(email),
            full_name: Set(full_name),
            role: Set(role.as_str().to_string()),
            password_hash: Set(password_hash),
            tenant_id: Set(tenant_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        user.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Course Operations
    // ========================================================================

    /// Create a new course owned by the given tenant
    pub async fn create_course(
        &self,
        tenant_id: TenantId,
        title: String,
        description: String,
        currency: String,
        price_cents: i64,
        instructor_id: Option<i64>,
    ) -> Result<Course> {
        let now = chrono::Utc::now();

        let course = CourseActiveModel {
            title: Set(title),
            description: Set(description),
            is_published: Set(false),
            currency: Set(currency),
            price_cents: Set(price_cents),
            instructor_id: Set(instructor_id),
            tenant_id: Set(tenant_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        course.insert(self.conn()).await.map_err(Into::into)
    }

    /// List courses, filtered to a tenant when one is resolved
    pub async fn list_courses(&self, tenant_id: Option<TenantId>) -> Result<Vec<Course>> {
        let mut query = CourseEntity::find();
        if let Some(tenant_id) = tenant_id {
            query = query.filter(CourseColumn::TenantId.eq(tenant_id));
        }
        query
            .order_by_asc(CourseColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find a course within a tenant.
    ///
    /// The tenant filter is part of the query, so a cross-tenant course id
    /// is indistinguishable from an absent one.
    pub async fn find_course_in_tenant(
        &self,
        course_id: i64,
        tenant_id: TenantId,
    ) -> Result<Option<Course>> {
        CourseEntity::find_by_id(course_id)
            .filter(CourseColumn::TenantId.eq(tenant_id))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Payment Operations
    // ========================================================================

    /// Create a pending payment correlated to an external checkout session.
    ///
    /// Fails `NotPurchasable` for a zero-price course and `NotFound` when
    /// the course is not in the given tenant. The unique constraint on
    /// `provider_payment_id` guarantees exactly one row per session.
    pub async fn create_pending_payment(
        &self,
        tenant_id: TenantId,
        user_id: i64,
        course: &Course,
        provider_payment_id: String,
    ) -> Result<Payment> {
        if course.tenant_id != tenant_id {
            return Err(AppError::NotFound {
                resource_type: "course".to_string(),
                id: course.id.to_string(),
            });
        }
        if !course.is_purchasable() {
            return Err(AppError::NotPurchasable);
        }

        let now = chrono::Utc::now();

        let payment = PaymentActiveModel {
            tenant_id: Set(tenant_id),
            user_id: Set(Some(user_id)),
            course_id: Set(Some(course.id)),
            provider: Set("stripe".to_string()),
            provider_payment_id: Set(provider_payment_id),
            amount_cents: Set(course.price_cents),
            currency: Set(course.currency.clone()),
            status: Set(PaymentStatus::Pending.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let payment = payment.insert(self.conn()).await?;
        metrics::record_payment_created(tenant_id);
        Ok(payment)
    }

    /// Find payment by the external checkout session id
    pub async fn find_payment_by_provider_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>> {
        PaymentEntity::find()
            .filter(PaymentColumn::ProviderPaymentId.eq(provider_payment_id))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List a user's own payments within a tenant
    pub async fn list_user_payments(
        &self,
        tenant_id: TenantId,
        user_id: i64,
    ) -> Result<Vec<Payment>> {
        PaymentEntity::find()
            .filter(PaymentColumn::TenantId.eq(tenant_id))
            .filter(PaymentColumn::UserId.eq(user_id))
            .order_by_desc(PaymentColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List all payments within a tenant
    pub async fn list_tenant_payments(&self, tenant_id: TenantId) -> Result<Vec<Payment>> {
        PaymentEntity::find()
            .filter(PaymentColumn::TenantId.eq(tenant_id))
            .order_by_desc(PaymentColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Apply a verified webhook event to the payment it correlates with.
    ///
    /// Idempotent under at-least-once delivery: unknown session ids,
    /// unhandled event types, and illegal transitions are all no-ops.
    /// Signature verification must already have happened upstream.
    pub async fn apply_webhook_event(
        &self,
        event_type: &str,
        provider_session_id: &str,
    ) -> Result<()> {
        let Some(target) = target_status_for_event(event_type) else {
            tracing::debug!(event_type, "Unhandled webhook event type, ignoring");
            metrics::record_webhook_event(event_type, "ignored");
            return Ok(());
        };

        let Some(payment) = self.find_payment_by_provider_id(provider_session_id).await? else {
            tracing::info!(
                provider_payment_id = provider_session_id,
                event_type,
                "Webhook event for unknown payment, ignoring"
            );
            metrics::record_webhook_event(event_type, "unknown_payment");
            return Ok(());
        };

        let current = payment.payment_status();
        match current {
            Some(current) if current.can_transition_to(target) => {
                if self
                    .transition_payment_status(provider_session_id, current, target)
                    .await?
                {
                    tracing::info!(
                        payment_id = payment.id,
                        provider_payment_id = provider_session_id,
                        from = current.as_str(),
                        to = target.as_str(),
                        "Payment status transitioned"
                    );
                    metrics::record_payment_transition(current, target);
                    metrics::record_webhook_event(event_type, "applied");
                } else {
                    // A concurrent delivery won the compare-and-set
                    tracing::info!(
                        payment_id = payment.id,
                        provider_payment_id = provider_session_id,
                        "Transition already applied by a concurrent delivery"
                    );
                    metrics::record_webhook_event(event_type, "duplicate");
                }
            }
            _ => {
                tracing::warn!(
                    payment_id = payment.id,
                    provider_payment_id = provider_session_id,
                    status = %payment.status,
                    event_type,
                    "Illegal payment transition ignored"
                );
                metrics::record_webhook_event(event_type, "illegal_transition");
            }
        }

        Ok(())
    }

    /// Compare-and-set the payment status.
    ///
    /// The `WHERE status = current` guard makes concurrent deliveries for
    /// the same session resolve to exactly one effective transition.
    /// Returns whether this call performed the update.
    async fn transition_payment_status(
        &self,
        provider_payment_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE payments SET status = $1, updated_at = now() \
             WHERE provider_payment_id = $2 AND status = $3",
            vec![
                to.as_str().into(),
                provider_payment_id.into(),
                from.as_str().into(),
            ],
        );

        let result = self.conn().execute(stmt).await?;
        Ok(result.rows_affected() > 0)
    }
}
