use core_config::{server::ServerConfig, FromEnv};
use database::redis::RedisConfig;
use dispatch_core::DispatchConfig;

pub use core_config::Environment;

/// Front-Gateway process configuration: composes the shared server/Redis
/// config components with the dispatch core's own knobs (spec.md §6).
#[derive(Clone, Debug)]
pub struct Config {
    pub redis: RedisConfig,
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let redis = RedisConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let dispatch = DispatchConfig::from_env()?;

        Ok(Self {
            redis,
            server,
            dispatch,
            environment,
        })
    }
}
