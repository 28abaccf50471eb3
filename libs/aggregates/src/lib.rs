//! The Aggregate-Producer (spec.md §4.4): executes one of the two named
//! warehouse aggregate queries against Postgres.

mod producer;

pub use producer::PostgresAggregateProducer;
