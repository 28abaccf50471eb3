use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::kind::AggregateKind;

/// A manufacturer -> count mapping, the shape every cached aggregate takes
/// (§3). Values are stored as the hash sees them — raw strings — because
/// decoding a non-numeric count into zero-with-a-warning is the
/// Front-Gateway's job (§4.1 step 1), not the adapter's.
pub type CacheEntry = HashMap<String, String>;

/// Errors surfaced by the cache/queue/bus boundary itself. Call sites map
/// these to `DispatchError::UpstreamFailure`; only `Subscription::recv_once`'s
/// timeout has its own, non-error, outcome (`SubscribeOutcome::TimedOut`).
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The literal pub/sub payloads a worker publishes (§4.3, §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    InternalErr,
    MaxRetryCount,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InternalErr => "internal_err",
            Self::MaxRetryCount => "max_retry_count",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a `Subscription`'s wait produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Message(String),
    TimedOut,
}

/// A live pub/sub subscription, returned already-established by
/// `CacheQueueBus::subscribe`.
///
/// Splitting "subscribe" from "wait for a message" (rather than one
/// combined `subscribe_once(topic, timeout)` call) is what lets the
/// Front-Gateway satisfy §4.1 step 3 in a straight line: `subscribe` only
/// returns once the subscription is live, so the gateway can enqueue
/// immediately afterward with no race window, then await `recv_once`
/// separately.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Subscription: Send {
    /// Waits up to `timeout` for exactly one message on this subscription.
    async fn recv_once(&mut self, timeout: Duration) -> Result<SubscribeOutcome, AdapterError>;
}

/// The thin, testable boundary over the key/value store (§4.5): hash
/// get/set with TTL, list push/blocking-pop, publish, subscribe-with-
/// timeout, and atomic counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheQueueBus: Send + Sync {
    /// Returns `None` only when the key is absent. A present-but-empty
    /// hash returns `Some(HashMap::new())` (§3: "present-but-empty hash
    /// present and must be treated as present").
    async fn cache_get(&self, kind: AggregateKind) -> Result<Option<CacheEntry>, AdapterError>;

    /// Replaces the entry and resets its TTL in one logical step.
    async fn cache_put(&self, kind: AggregateKind, entry: &CacheEntry, ttl: Duration) -> Result<(), AdapterError>;

    async fn queue_push(&self, raw: &str) -> Result<(), AdapterError>;

    /// Blocking pop with a server-side timeout. `None` means the timeout
    /// elapsed with nothing to pop.
    async fn queue_blocking_pop(&self, timeout: Duration) -> Result<Option<String>, AdapterError>;

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), AdapterError>;

    /// Subscribes to `topic` and returns only once the subscription is
    /// fully established — a message published after this call returns is
    /// guaranteed to be observed by the returned `Subscription` (§4.1 step
    /// 3, §9 "Race between subscribe and publish").
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, AdapterError>;

    /// Atomically increments the counter at `key` and returns the new value.
    async fn counter_inc(&self, key: &str) -> Result<i64, AdapterError>;

    async fn counter_dec(&self, key: &str) -> Result<(), AdapterError>;

    /// Returns 0 when the counter key is absent.
    async fn counter_get(&self, key: &str) -> Result<i64, AdapterError>;

    /// Sets (or refreshes) the counter key's TTL.
    ///
    /// The source never expires `lock:<principal>`/`retry:<principal>`,
    /// which lets them leak upward forever if a worker crashes mid-flight
    /// (§9 "Principal counter hygiene"). The redesign recommended there —
    /// TTL both counters — is implemented by having the worker call this
    /// after every increment.
    async fn counter_expire(&self, key: &str, ttl: Duration) -> Result<(), AdapterError>;

    /// Resets a counter to zero.
    ///
    /// Used to reset `retries(principal)` to zero on a successful
    /// admission, per the same §9 redesign recommendation, so a
    /// principal's retry count doesn't ratchet towards `maxRetryCount`
    /// across unrelated bursts of contention.
    async fn counter_reset(&self, key: &str) -> Result<(), AdapterError>;
}
