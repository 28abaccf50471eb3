use core_config::{env_or_default, FromEnv};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use dispatch_core::DispatchConfig;

pub use core_config::Environment;

/// Worker-Dispatcher process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub database: PostgresConfig,
    pub redis: RedisConfig,
    pub dispatch: DispatchConfig,
    pub environment: Environment,
    pub health_port: u16,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?;
        let redis = RedisConfig::from_env()?;
        let dispatch = DispatchConfig::from_env()?;
        let health_port = env_or_default("WORKER_HEALTH_PORT", "8081").parse().unwrap_or(8081);

        Ok(Self {
            database,
            redis,
            dispatch,
            environment,
            health_port,
        })
    }
}
