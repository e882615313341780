//! Per-request metrics recording

use axum::{extract::Request, middleware::Next, response::Response};
use coursehub_common::metrics::RequestMetrics;

/// Record a request counter and latency histogram for every request
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request.uri().path().to_string();

    let metrics = RequestMetrics::start(&method, &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
