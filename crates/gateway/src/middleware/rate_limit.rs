//! Rate limiting middleware using a token bucket

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use coursehub_common::config::RateLimitConfig;
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Process-wide rate limiter backed by the governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Build the rate limiter from configuration; `None` when disabled or the
/// configured rates are zero
pub fn create_rate_limiter(config: &RateLimitConfig) -> Option<Arc<GlobalRateLimiter>> {
    if !config.enabled {
        return None;
    }

    let rps = NonZeroU32::new(config.requests_per_second)?;
    let burst = NonZeroU32::new(config.burst)?;
    let quota = Quota::per_second(rps).allow_burst(burst);

    Some(Arc::new(RateLimiter::direct(quota)))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    request: Request,
    next: Next,
    limiter: Arc<GlobalRateLimiter>,
) -> Result<Response, StatusCode> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!("Rate limit exceeded");
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_yields_no_limiter() {
        let config = RateLimitConfig {
            requests_per_second: 50,
            burst: 100,
            enabled: false,
        };
        assert!(create_rate_limiter(&config).is_none());
    }

    #[test]
    fn test_enabled_limiter_admits_requests() {
        let config = RateLimitConfig {
            requests_per_second: 100,
            burst: 200,
            enabled: true,
        };
        let limiter = create_rate_limiter(&config).unwrap();
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_zero_rate_yields_no_limiter() {
        let config = RateLimitConfig {
            requests_per_second: 0,
            burst: 0,
            enabled: true,
        };
        assert!(create_rate_limiter(&config).is_none());
    }
}
