pub mod server;
pub mod tracing;

use std::env;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment (dev = local, prod = deployed)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load, parse, and default a numeric environment variable
pub fn env_parse_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| ConfigError::ParseError {
            key: key.to_string(),
            details: format!("{}", e),
        }),
        Err(_) => Ok(default),
    }
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Load a required environment variable and parse it.
pub fn env_parse_required<T>(key: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_required(key)?.parse().map_err(|e| ConfigError::ParseError {
        key: key.to_string(),
        details: format!("{}", e),
    })
}

/// Load a `.env` file if present. Missing file is not an error — the process
/// falls back to whatever is already in the environment.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
        temp_env::with_var("APP_ENV", Some("Production"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
    }

    #[test]
    fn environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn env_or_default_with_value() {
        temp_env::with_var("TEST_VAR_CC", Some("test_value"), || {
            assert_eq!(env_or_default("TEST_VAR_CC", "default"), "test_value");
        });
    }

    #[test]
    fn env_or_default_without_value() {
        temp_env::with_var_unset("MISSING_VAR_CC", || {
            assert_eq!(env_or_default("MISSING_VAR_CC", "default_value"), "default_value");
        });
    }

    #[test]
    fn env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED_CC", || {
            let err = env_required("MISSING_REQUIRED_CC").unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED_CC"));
        });
    }

    #[test]
    fn env_parse_or_default_uses_default_when_unset() {
        temp_env::with_var_unset("PARSE_DEFAULT_CC", || {
            let value: u32 = env_parse_or_default("PARSE_DEFAULT_CC", 7).unwrap();
            assert_eq!(value, 7);
        });
    }

    #[test]
    fn env_parse_or_default_parses_set_value() {
        temp_env::with_var("PARSE_DEFAULT_CC2", Some("42"), || {
            let value: u32 = env_parse_or_default("PARSE_DEFAULT_CC2", 7).unwrap();
            assert_eq!(value, 42);
        });
    }

    #[test]
    fn env_parse_or_default_rejects_garbage() {
        temp_env::with_var("PARSE_DEFAULT_CC3", Some("not_a_number"), || {
            let result: Result<u32, _> = env_parse_or_default("PARSE_DEFAULT_CC3", 7);
            assert!(result.is_err());
        });
    }
}
