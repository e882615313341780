//! Configuration management for CourseHub services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Payment provider configuration
    pub payments: PaymentsConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Secret for token signing
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Token signing algorithm
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_secs: u64,

    /// Tenant ID header name
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    /// API secret key for the payment provider
    pub secret_key: Option<String>,

    /// Webhook signing secret for inbound events
    pub webhook_secret: Option<String>,

    /// Provider API base URL (overridable for testing)
    #[serde(default = "default_payments_api_base")]
    pub api_base: String,

    /// Redirect URL after a successful checkout
    #[serde(default = "default_checkout_success_url")]
    pub checkout_success_url: String,

    /// Redirect URL after a cancelled checkout
    #[serde(default = "default_checkout_cancel_url")]
    pub checkout_cancel_url: String,

    /// Provider request timeout in seconds
    #[serde(default = "default_payments_timeout")]
    pub request_timeout_secs: u64,

    /// Accepted clock skew for webhook signature timestamps, in seconds
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 50 }
fn default_min_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_jwt_secret() -> String { "dev-secret-key-change".to_string() }
fn default_jwt_algorithm() -> String { "HS256".to_string() }
fn default_access_token_ttl() -> u64 { 1800 }
fn default_refresh_token_ttl() -> u64 { 2_592_000 }
fn default_tenant_header() -> String { "X-Tenant-ID".to_string() }
fn default_payments_api_base() -> String { "https://api.stripe.com".to_string() }
fn default_checkout_success_url() -> String {
    "http://localhost:3000/payments/success?session_id={CHECKOUT_SESSION_ID}".to_string()
}
fn default_checkout_cancel_url() -> String {
    "http://localhost:3000/payments/cancel".to_string()
}
fn default_payments_timeout() -> u64 { 30 }
fn default_webhook_tolerance() -> u64 { 300 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "coursehub".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_rate_limit_enabled() -> bool { false }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/coursehub")?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Whether the signing secret is still the development default
    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == default_jwt_secret()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/coursehub".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            auth: AuthConfig {
                jwt_secret: default_jwt_secret(),
                jwt_algorithm: default_jwt_algorithm(),
                access_token_ttl_secs: default_access_token_ttl(),
                refresh_token_ttl_secs: default_refresh_token_ttl(),
                tenant_header: default_tenant_header(),
            },
            payments: PaymentsConfig {
                secret_key: None,
                webhook_secret: None,
                api_base: default_payments_api_base(),
                checkout_success_url: default_checkout_success_url(),
                checkout_cancel_url: default_checkout_cancel_url(),
                request_timeout_secs: default_payments_timeout(),
                webhook_tolerance_secs: default_webhook_tolerance(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: default_rate_limit(),
                burst: default_burst(),
                enabled: default_rate_limit_enabled(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.tenant_header, "X-Tenant-ID");
        assert_eq!(config.auth.jwt_algorithm, "HS256");
    }

    #[test]
    fn test_token_lifetimes_differ() {
        let config = AppConfig::default();
        // Access tokens are short-lived, refresh tokens long-lived
        assert!(config.auth.access_token_ttl_secs < config.auth.refresh_token_ttl_secs);
    }

    #[test]
    fn test_default_secret_flagged() {
        let mut config = AppConfig::default();
        assert!(config.uses_default_secret());
        config.auth.jwt_secret = "prod-secret".to_string();
        assert!(!config.uses_default_secret());
    }
}
