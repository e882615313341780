//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use crate::db::models::PaymentStatus;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all CourseHub metrics
pub const METRICS_PREFIX: &str = "coursehub";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 250ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms - P50 target
    0.100, // 100ms
    0.250, // 250ms - P99 target
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Auth metrics
    describe_counter!(
        format!("{}_auth_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Total failed authentication attempts"
    );

    // Payment metrics
    describe_counter!(
        format!("{}_payments_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total pending payments created"
    );

    describe_counter!(
        format!("{}_payment_transitions_total", METRICS_PREFIX),
        Unit::Count,
        "Total payment status transitions applied"
    );

    describe_counter!(
        format!("{}_webhook_events_total", METRICS_PREFIX),
        Unit::Count,
        "Total webhook events received, by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a failed authentication attempt
pub fn record_auth_failure(reason: &str) {
    counter!(
        format!("{}_auth_failures_total", METRICS_PREFIX),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record creation of a pending payment
pub fn record_payment_created(tenant_id: i64) {
    counter!(
        format!("{}_payments_created_total", METRICS_PREFIX),
        "tenant" => tenant_id.to_string()
    )
    .increment(1);
}

/// Record an applied payment status transition
pub fn record_payment_transition(from: PaymentStatus, to: PaymentStatus) {
    counter!(
        format!("{}_payment_transitions_total", METRICS_PREFIX),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Record a webhook event and how it was handled
pub fn record_webhook_event(event_type: &str, outcome: &str) {
    counter!(
        format!("{}_webhook_events_total", METRICS_PREFIX),
        "event_type" => event_type.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        assert!(LATENCY_BUCKETS.contains(&0.050));
        assert!(LATENCY_BUCKETS.contains(&0.250));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/courses");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }
}
