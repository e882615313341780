//! Authentication and authorization core
//!
//! Provides:
//! - Token issuance and validation ([`token`])
//! - Password hashing ([`password`])
//! - The closed role set and per-operation role checks
//! - Tenant-match enforcement for tenant-scoped operations
//!
//! Everything here is pure and IO-free; looking up the subject behind a
//! token is the caller's job.

pub mod password;
pub mod token;

pub use token::{Claims, TokenPurpose, TokenService};

use crate::db::models::User;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenant identifier (an organization id)
pub type TenantId = i64;

/// Closed set of user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }

    /// Parse a stored role string; unknown values yield `None`
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "instructor" => Some(Role::Instructor),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    /// All roles, for "any authenticated user" checks
    pub const ALL: &'static [Role] = &[Role::Admin, Role::Instructor, Role::Student];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass only if the user's role is in the required set.
///
/// An unparseable stored role fails closed.
pub fn authorize(user: &User, required: &[Role]) -> Result<()> {
    let role = Role::parse(&user.role).ok_or_else(|| AppError::Forbidden {
        message: format!("Unknown role '{}'", user.role),
    })?;

    if required.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Forbidden {
            message: "Insufficient role".to_string(),
        })
    }
}

/// Pass only if a tenant was resolved and it equals the user's tenant.
///
/// Every tenant-scoped mutating operation and every "list my own" read
/// must call this before touching data. Holds for every role; there is no
/// super-admin bypass.
pub fn enforce_tenant_match(user: &User, resolved: Option<TenantId>) -> Result<()> {
    match resolved {
        Some(tenant_id) if tenant_id == user.tenant_id => Ok(()),
        _ => Err(AppError::TenantMismatch),
    }
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: &str, tenant_id: i64) -> User {
        let now = Utc::now();
        User {
            id: 1,
            email: "a@acme.io".to_string(),
            full_name: "Ada Admin".to_string(),
            role: role.to_string(),
            password_hash: String::new(),
            tenant_id,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_authorize_course_creation_roles() {
        let required = &[Role::Admin, Role::Instructor];

        assert!(authorize(&user("admin", 1), required).is_ok());
        assert!(authorize(&user("instructor", 1), required).is_ok());
        assert!(matches!(
            authorize(&user("student", 1), required),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_authorize_any_authenticated() {
        for role in ["admin", "instructor", "student"] {
            assert!(authorize(&user(role, 1), Role::ALL).is_ok());
        }
    }

    #[test]
    fn test_authorize_unknown_role_fails_closed() {
        assert!(matches!(
            authorize(&user("superuser", 1), Role::ALL),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_tenant_match_ok() {
        assert!(enforce_tenant_match(&user("student", 7), Some(7)).is_ok());
    }

    #[test]
    fn test_tenant_mismatch_forbidden_for_every_role() {
        for role in ["admin", "instructor", "student"] {
            assert!(matches!(
                enforce_tenant_match(&user(role, 7), Some(8)),
                Err(AppError::TenantMismatch)
            ));
        }
    }

    #[test]
    fn test_unresolved_tenant_forbidden() {
        for role in ["admin", "instructor", "student"] {
            assert!(matches!(
                enforce_tenant_match(&user(role, 7), None),
                Err(AppError::TenantMismatch)
            ));
        }
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("abc.def.ghi"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }
}
