//! PostgreSQL database connector and utilities, built on sea-orm.

mod config;
mod connector;
mod health;

pub use config::PostgresConfig;
pub use connector::{connect_from_config, connect_from_config_with_retry};
pub use health::check_health;

pub use sea_orm::{DatabaseBackend, DatabaseConnection, Statement};
