//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{BridgeConfig, Mode};
use crate::config::validation::{validate_config, ValidationError};

pub const MODE_VAR: &str = "CONNECT_SERVER_MODE";
pub const ADDR_VAR: &str = "CONNECT_SERVER_ADDR";
pub const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(r#"incorrect CONNECT_SERVER_MODE environment value {0:?}, expected "lambda" or "http""#)]
    InvalidMode(String),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, take transport selection from the process
/// environment, and validate.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

fn load_config_with<F>(path: &Path, lookup: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let content = fs::read_to_string(path)?;
    let config: BridgeConfig = toml::from_str(&content)?;
    apply_env(config, lookup)
}

/// Build the configuration from defaults and the process environment alone.
pub fn config_from_env() -> Result<BridgeConfig, ConfigError> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build the configuration from defaults and an arbitrary variable lookup.
pub fn config_from_lookup<F>(lookup: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env(BridgeConfig::default(), lookup)
}

fn apply_env<F>(mut config: BridgeConfig, lookup: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mode = lookup(MODE_VAR)
        .map(|m| m.trim().to_lowercase())
        .unwrap_or_default();
    config.mode = match mode.as_str() {
        "lambda" => Mode::Lambda,
        "http" | "" => Mode::Http,
        _ => return Err(ConfigError::InvalidMode(mode)),
    };

    config.http.bind_address = lookup(ADDR_VAR).map(|addr| normalize_addr(&addr));
    config.lambda.runtime_api = lookup(RUNTIME_API_VAR).map(|api| api.trim().to_string());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Turn a listen address into something `TcpListener::bind` accepts.
///
/// An empty address means the default HTTP port on every interface, and a
/// bare `:port` binds that port on every interface.
pub fn normalize_addr(addr: &str) -> String {
    let addr = addr.trim();
    if addr.is_empty() {
        "0.0.0.0:80".to_string()
    } else if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}
