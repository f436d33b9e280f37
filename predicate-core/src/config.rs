use std::env;

use tracing::debug;

use crate::errors::{ConfigError, CoreError};

/// Nesting bound applied when no configuration overrides it.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Address the validation service binds to by default.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8090";

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Settings shared by the validator binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateConfig {
    pub environment: Environment,
    pub max_depth: usize,
    pub bind_address: String,
    pub log_level: Option<String>,
}

impl Default for PredicateConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            log_level: None,
        }
    }
}

impl PredicateConfig {
    /// Loads configuration from the process environment (`PREDICATE_*`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("PREDICATE_")
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `CATALOG_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let environment = env::var(key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let depth_key = key("MAX_DEPTH");
        let max_depth = match env::var(&depth_key) {
            Ok(raw) => parse_depth(&depth_key, &raw)?,
            Err(_) => DEFAULT_MAX_DEPTH,
        };

        let bind_address =
            env::var(key("BIND")).unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
        let log_level = env::var(key("LOG")).ok();
        debug!(prefix, ?environment, max_depth, "loaded predicate configuration");

        Ok(Self {
            environment,
            max_depth,
            bind_address,
            log_level,
        })
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_depth(key: &str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Helper that loads config and converts to the canonical core error type.
pub fn load_config() -> Result<PredicateConfig, CoreError> {
    Ok(PredicateConfig::from_env()?)
}
