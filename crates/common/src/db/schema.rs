//! Schema bootstrap DDL
//!
//! Uniqueness and referential-integrity rules live in the datastore, not
//! in application logic: unique email/name/slug/provider_payment_id, and
//! ON DELETE CASCADE / SET NULL mirroring entity ownership. Statements are
//! idempotent so startup can run them unconditionally.

/// DDL statements executed in order at startup
pub const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL UNIQUE,
        slug        TEXT NOT NULL UNIQUE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id             BIGSERIAL PRIMARY KEY,
        email          TEXT NOT NULL UNIQUE,
        full_name      TEXT NOT NULL,
        role           TEXT NOT NULL,
        password_hash  TEXT NOT NULL,
        tenant_id      BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_users_tenant_id ON users(tenant_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id             BIGSERIAL PRIMARY KEY,
        title          TEXT NOT NULL,
        description    TEXT NOT NULL,
        is_published   BOOLEAN NOT NULL DEFAULT FALSE,
        currency       TEXT NOT NULL DEFAULT 'usd',
        price_cents    BIGINT NOT NULL DEFAULT 0 CHECK (price_cents >= 0),
        instructor_id  BIGINT REFERENCES users(id) ON DELETE SET NULL,
        tenant_id      BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_courses_tenant_id ON courses(tenant_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id                   BIGSERIAL PRIMARY KEY,
        tenant_id            BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        user_id              BIGINT REFERENCES users(id) ON DELETE SET NULL,
        course_id            BIGINT REFERENCES courses(id) ON DELETE SET NULL,
        provider             TEXT NOT NULL DEFAULT 'stripe',
        provider_payment_id  TEXT NOT NULL UNIQUE,
        amount_cents         BIGINT NOT NULL,
        currency             TEXT NOT NULL DEFAULT 'usd',
        status               TEXT NOT NULL DEFAULT 'pending',
        created_at           TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at           TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_payments_tenant_id ON payments(tenant_id)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_payments_user_id ON payments(user_id)
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_is_idempotent() {
        for stmt in DDL {
            assert!(stmt.contains("IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_unique_constraints_present() {
        // Four uniqueness rules: org name, org slug, user email, provider payment id
        let all = DDL.join("\n");
        assert_eq!(all.matches("UNIQUE").count(), 4);
    }
}
