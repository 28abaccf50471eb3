//! Observability utilities for the dispatch core and its front door.
//!
//! - Prometheus metrics recording and export (`init_metrics`, `metrics_handler`)
//! - `DispatchMetrics`: the dispatch-core-specific instrumentation
//! - Axum middleware for automatic HTTP request metrics

pub mod dispatch;
pub mod middleware;

pub use dispatch::DispatchMetrics;
pub use middleware::metrics_middleware;

pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Installs the Prometheus recorder. Call once at process startup.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder");

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();
        handle
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for a `/metrics` route.
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!("http_request_duration_seconds", "HTTP request duration in seconds");
    describe_counter!("http_requests_errors_total", "Total number of HTTP request errors");

    describe_gauge!("dispatch_active_workers", "Currently running workers, process-wide");
    describe_counter!("dispatch_requests_total", "Requests handled by the Front-Gateway, by outcome");
    describe_counter!("dispatch_cache_lookups_total", "Front-Gateway cache lookups, by hit/miss");
    describe_counter!("dispatch_admissions_total", "Worker admission checks, by admitted/denied");
    describe_histogram!("dispatch_backoff_seconds", "Fibonacci back-off delay applied before re-enqueue");
    describe_counter!("dispatch_worker_outcomes_total", "Outcomes published by workers, by kind");
    describe_histogram!("dispatch_producer_duration_seconds", "Aggregate-Producer query duration");
}
