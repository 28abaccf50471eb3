//! Database library providing connectors and utilities for PostgreSQL and Redis.
//!
//! Both connectors support `FromEnv` configuration loading and
//! retry-with-backoff connect helpers, matching the pattern used across the
//! rest of the workspace.

pub mod common;
pub mod postgres;
pub mod redis;

pub use common::{DatabaseError, DatabaseResult};
