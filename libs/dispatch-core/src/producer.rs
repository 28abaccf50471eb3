use async_trait::async_trait;

use crate::kind::AggregateKind;

/// Errors a concrete `AggregateProducer` (the Postgres-backed implementation
/// lives in the `aggregates` crate) can raise while running a query.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("database error: {0}")]
    Database(String),
}

/// One row of the result: a manufacturer name paired with the bought count
/// for the requested `AggregateKind` (spec.md §3, §5).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ManufacturerCount {
    pub manufacturer: String,
    pub count: i64,
}

/// The relational-source boundary (§4.4): runs one of the two named
/// aggregate queries and returns a row per manufacturer.
///
/// Implemented concretely against Postgres in the `aggregates` crate; kept
/// as a trait here so `Worker` can be exercised against a fake in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AggregateProducer: Send + Sync {
    async fn produce(&self, kind: AggregateKind) -> Result<Vec<ManufacturerCount>, AggregateError>;
}
