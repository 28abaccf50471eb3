//! Dispatch-core-specific metrics.

use metrics::{counter, gauge, histogram};

/// Instrumentation points for the Front-Gateway, Worker-Dispatcher, and Worker.
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Set the process-wide active worker gauge (§5's `activeWorkers`).
    pub fn set_active_workers(count: usize) {
        gauge!("dispatch_active_workers").set(count as f64);
    }

    pub fn record_cache_hit(kind: &str) {
        counter!("dispatch_cache_lookups_total", "kind" => kind.to_string(), "result" => "hit").increment(1);
    }

    pub fn record_cache_miss(kind: &str) {
        counter!("dispatch_cache_lookups_total", "kind" => kind.to_string(), "result" => "miss").increment(1);
    }

    /// Record the terminal result the Front-Gateway returned to its caller.
    pub fn record_gateway_result(kind: &str, result: &str) {
        counter!("dispatch_requests_total", "kind" => kind.to_string(), "result" => result.to_string()).increment(1);
    }

    pub fn record_admission(principal_admitted: bool) {
        let label = if principal_admitted { "admitted" } else { "denied" };
        counter!("dispatch_admissions_total", "result" => label).increment(1);
    }

    pub fn record_backoff(delay_secs: u64) {
        histogram!("dispatch_backoff_seconds").record(delay_secs as f64);
    }

    pub fn record_worker_outcome(outcome: &str) {
        counter!("dispatch_worker_outcomes_total", "outcome" => outcome.to_string()).increment(1);
    }

    pub fn record_producer_duration(kind: &str, duration_secs: f64) {
        histogram!("dispatch_producer_duration_seconds", "kind" => kind.to_string()).record(duration_secs);
    }
}
