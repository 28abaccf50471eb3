//! Request-dispatch core.
//!
//! ```text
//! Front-Gateway --(miss)--> shared queue --> Worker-Dispatcher --> Worker --> Aggregate-Producer
//!       ^                                                             |
//!       +--------------------------- pub/sub -------------------------+
//! ```
//!
//! This crate owns the coordination contract between a synchronous
//! front-end handler, a shared work queue, a bounded pool of concurrent
//! workers, a per-principal admission/retry counter, and a request-scoped
//! pub/sub rendezvous. Everything outside that contract (HTTP routing, SQL,
//! process bootstrap) lives in the binaries and in `aggregates`.

mod adapter;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fibonacci;
pub mod gateway;
pub mod kind;
pub mod producer;
pub mod redis_adapter;
pub mod request;
pub mod worker;

pub use adapter::{AdapterError, CacheEntry, CacheQueueBus, Outcome, SubscribeOutcome, Subscription};
pub use config::DispatchConfig;
pub use dispatcher::WorkerDispatcher;
pub use error::DispatchError;
pub use gateway::FrontGateway;
pub use kind::AggregateKind;
pub use producer::{AggregateError, AggregateProducer, ManufacturerCount};
pub use redis_adapter::RedisCacheQueueBus;
pub use request::{Request, RequestParseError};

pub type DispatchResult<T> = Result<T, DispatchError>;
