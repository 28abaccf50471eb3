use core_config::{env_or_default, ConfigError, FromEnv};

/// Redis connection settings, loadable from the environment.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Load `RedisConfig` from the environment.
///
/// `REDIS_URL` is preferred; `REDIS_HOST` is accepted for compatibility with
/// deployments that still set the older name.
impl FromEnv for RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = core_config::env_required("REDIS_URL")
            .or_else(|_| core_config::env_required("REDIS_HOST"))
            .unwrap_or_else(|_| env_or_default("REDIS_URL", "redis://127.0.0.1:6379"));

        Ok(Self { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_url() {
        let config = RedisConfig::new("redis://localhost:6379");
        assert_eq!(config.url, "redis://localhost:6379");
    }

    #[test]
    fn default_points_at_localhost() {
        assert_eq!(RedisConfig::default().url, "redis://127.0.0.1:6379");
    }

    #[test]
    fn from_env_prefers_redis_url() {
        temp_env::with_vars(
            [
                ("REDIS_URL", Some("redis://primary:6379")),
                ("REDIS_HOST", Some("redis://fallback:6379")),
            ],
            || {
                let config = RedisConfig::from_env().unwrap();
                assert_eq!(config.url, "redis://primary:6379");
            },
        );
    }

    #[test]
    fn from_env_falls_back_to_redis_host() {
        temp_env::with_vars(
            [
                ("REDIS_URL", None::<&str>),
                ("REDIS_HOST", Some("redis://prod:6379")),
            ],
            || {
                let config = RedisConfig::from_env().unwrap();
                assert_eq!(config.url, "redis://prod:6379");
            },
        );
    }

    #[test]
    fn from_env_defaults_when_unset() {
        temp_env::with_vars([("REDIS_URL", None::<&str>), ("REDIS_HOST", None::<&str>)], || {
            let config = RedisConfig::from_env().unwrap();
            assert_eq!(config.url, "redis://127.0.0.1:6379");
        });
    }
}
