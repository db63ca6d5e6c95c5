//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the caller-facing shared secret.
pub const ENV_PROXY_TOKEN: &str = "METLY_PROXY_TOKEN";
/// Environment variable holding the upstream provider key.
pub const ENV_UPSTREAM_API_KEY: &str = "OPENROUTER_API_KEY";
/// Environment variable overriding the allowed CORS origin.
pub const ENV_CORS_ALLOW_ORIGIN: &str = "CORS_ALLOW_ORIGIN";
/// Environment variable overriding the listener address.
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the startup configuration from the optional file and the process
/// environment.
pub fn load_startup_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Layer the configuration: the optional file first, then `lookup` on top,
/// then validation of the merged result.
pub fn load_config_with_env<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment-provided values. Unset and empty variables are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(token) = get(ENV_PROXY_TOKEN) {
        config.auth.proxy_token = token;
    }
    if let Some(key) = get(ENV_UPSTREAM_API_KEY) {
        config.upstream.api_key = key;
    }
    if let Some(origin) = get(ENV_CORS_ALLOW_ORIGIN) {
        config.auth.cors_allow_origin = origin;
    }
    if let Some(addr) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
}
