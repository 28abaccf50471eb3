use thiserror::Error;

/// The error taxonomy the Front-Gateway surfaces to callers (spec.md §7).
///
/// Orthogonal to transport: it is the gateway's job (and only the
/// gateway's) to translate this into an HTTP status.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Caller input was invalid (e.g. missing principal). Not retriable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The worker exhausted the per-principal retry budget.
    #[error("throttled: too many requests for this principal")]
    Throttled,

    /// The gateway's pub/sub wait expired without a notification.
    #[error("timed out waiting for result")]
    Timeout,

    /// Any cache, queue, producer, or pub/sub failure.
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
}
