//! Tenant resolution
//!
//! Derives the acting tenant for a request from the configured tenant
//! header. The middleware attaches a [`TenantContext`] to request
//! extensions; the extractor prefers that value and falls back to reading
//! the header itself, so handlers get the same answer with or without the
//! middleware installed.
//!
//! An unresolved tenant is a valid state: tenant-agnostic reads accept
//! it, while every tenant-scoped operation rejects it through
//! `enforce_tenant_match`.

use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use coursehub_common::auth::TenantId;
use coursehub_common::errors::AppError;

/// The tenant resolved for the current request, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantContext(Option<TenantId>);

impl TenantContext {
    /// The resolved tenant id, or `None` when the request is tenant-agnostic
    pub fn resolved(&self) -> Option<TenantId> {
        self.0
    }

    /// Read the tenant header; a missing, empty, or non-numeric value
    /// resolves as unresolved rather than an error
    pub fn from_headers(headers: &HeaderMap, header_name: &str) -> Self {
        let tenant = headers
            .get(header_name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse::<TenantId>().ok());
        Self(tenant)
    }
}

/// Middleware attaching the resolved tenant to request extensions
pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = TenantContext::from_headers(request.headers(), &state.config.auth.tenant_header);
    request.extensions_mut().insert(context);
    next.run(request).await
}

impl FromRequestParts<AppState> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Prefer the middleware-attached context
        if let Some(context) = parts.extensions.get::<TenantContext>() {
            return Ok(*context);
        }
        Ok(TenantContext::from_headers(
            &parts.headers,
            &state.config.auth.tenant_header,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const HEADER: &str = "X-Tenant-ID";

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(HEADER, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_resolves_numeric_header() {
        let context = TenantContext::from_headers(&headers(Some("42")), HEADER);
        assert_eq!(context.resolved(), Some(42));
    }

    #[test]
    fn test_missing_header_unresolved() {
        let context = TenantContext::from_headers(&headers(None), HEADER);
        assert_eq!(context.resolved(), None);
    }

    #[test]
    fn test_empty_header_unresolved() {
        let context = TenantContext::from_headers(&headers(Some("")), HEADER);
        assert_eq!(context.resolved(), None);
    }

    #[test]
    fn test_non_numeric_header_unresolved() {
        let context = TenantContext::from_headers(&headers(Some("acme")), HEADER);
        assert_eq!(context.resolved(), None);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let context = TenantContext::from_headers(&headers(Some(" 7 ")), HEADER);
        assert_eq!(context.resolved(), Some(7));
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let mut map = HeaderMap::new();
        map.insert("x-tenant-id", HeaderValue::from_static("9"));
        let context = TenantContext::from_headers(&map, HEADER);
        assert_eq!(context.resolved(), Some(9));
    }
}
