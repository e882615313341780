//! CourseHub API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Tenant resolution
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use coursehub_common::{
    auth::TokenService,
    config::AppConfig,
    db::DbPool,
    metrics,
    payments::{PaymentProvider, StripeClient},
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub tokens: Arc<TokenService>,
    pub provider: Option<Arc<dyn PaymentProvider>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_new(&config.observability.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting CourseHub API Gateway v{}", coursehub_common::VERSION);

    if config.uses_default_secret() {
        warn!("Token signing secret is the development default; set APP__AUTH__JWT_SECRET");
    }

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .install()?;
        info!("Metrics exporter listening on {}", addr);
    }

    // Initialize database connection and ensure the schema exists
    let db = DbPool::new(&config.database).await?;
    db.ensure_schema().await?;

    // Token service
    let tokens = Arc::new(TokenService::new(&config.auth)?);

    // Payment provider (checkout is disabled without a configured key)
    let provider: Option<Arc<dyn PaymentProvider>> = if config.payments.secret_key.is_some() {
        Some(Arc::new(StripeClient::new(&config.payments)?))
    } else {
        warn!("Payment provider secret key not configured; checkout disabled");
        None
    };

    let config = Arc::new(config);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        tokens,
        provider,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut router = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Auth endpoints (public)
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/token", post(handlers::auth::token))
        .route("/auth/refresh", post(handlers::auth::refresh))
        // Auth endpoints (authenticated)
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/user/profile", get(handlers::auth::profile))
        // Organization endpoints
        .route(
            "/organizations",
            post(handlers::organizations::create_organization),
        )
        .route(
            "/organizations/{slug}",
            get(handlers::organizations::get_organization),
        )
        // Course endpoints
        .route(
            "/courses",
            get(handlers::courses::list_courses).post(handlers::courses::create_course),
        )
        // Payment endpoints
        .route("/payments/checkout", post(handlers::payments::checkout))
        .route("/payments/webhook", post(handlers::payments::webhook))
        .route("/payments/mine", get(handlers::payments::list_my_payments))
        .route("/payments", get(handlers::payments::list_tenant_payments));

    // Optional rate limiting
    if let Some(limiter) = middleware::rate_limit::create_rate_limiter(&state.config.rate_limit) {
        router = router.layer(axum::middleware::from_fn(
            move |request: axum::extract::Request, next: axum::middleware::Next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(request, next, limiter).await
                }
            },
        ));
    }

    // Compose the app
    router
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::tenant::resolve_tenant,
        ))
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
