use core_config::{env_parse_or_default, env_parse_required, ConfigError, FromEnv};

/// The six knobs spec.md §6 names for the dispatch core.
#[derive(Clone, Copy, Debug)]
pub struct DispatchConfig {
    /// Seconds a cache entry lives after its last write.
    pub cache_expire_seconds: u64,
    /// Seconds the gateway waits on its pub/sub subscription before timing out.
    pub subscribe_timeout_seconds: u64,
    /// Per-principal in-flight worker ceiling.
    pub max_requests_count: i64,
    /// Per-principal re-enqueue ceiling.
    pub max_retry_count: i64,
    /// Process-wide concurrent worker ceiling.
    pub max_workers_count: usize,
    /// Milliseconds between ceiling re-checks in spec.md §4.2 step 3's
    /// original polling design. `WorkerDispatcher` uses a semaphore instead
    /// (§9), so this knob is read and validated but otherwise unused; kept
    /// so `MAX_WORKERS_COUNT`'s sibling env vars still round-trip.
    pub workers_count_check_time_ms: u64,
}

impl DispatchConfig {
    /// Defaults matching spec.md §6, useful for tests.
    pub fn with_max_workers(max_workers_count: usize) -> Self {
        Self {
            cache_expire_seconds: 30,
            subscribe_timeout_seconds: 5,
            max_requests_count: 10,
            max_retry_count: 10,
            max_workers_count,
            workers_count_check_time_ms: 50,
        }
    }
}

impl FromEnv for DispatchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cache_expire_seconds: env_parse_or_default("CACHE_EXPIRE_SECONDS", 30)?,
            subscribe_timeout_seconds: env_parse_or_default("SUBSCRIBE_TIMEOUT_SECONDS", 5)?,
            max_requests_count: env_parse_or_default("MAX_REQUESTS_COUNT", 10)?,
            max_retry_count: env_parse_or_default("MAX_RETRY_COUNT", 10)?,
            max_workers_count: env_parse_required("MAX_WORKERS_COUNT")?,
            workers_count_check_time_ms: env_parse_or_default("WORKERS_COUNT_CHECK_TIME_MS", 50)?,
        })
    }
}
