//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{BridgeConfig, Mode};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing CONNECT_SERVER_ADDR environment value")]
    MissingBindAddress,

    #[error("missing AWS_LAMBDA_RUNTIME_API environment value")]
    MissingRuntimeApi,

    #[error("http.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("http.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("observability.log_level must not be empty")]
    EmptyLogLevel,
}

/// Check a configuration for semantic problems.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.mode {
        Mode::Http => {
            if config.http.bind_address.is_none() {
                errors.push(ValidationError::MissingBindAddress);
            }
        }
        Mode::Lambda => {
            let api = config.lambda.runtime_api.as_deref().unwrap_or_default();
            if api.trim().is_empty() {
                errors.push(ValidationError::MissingRuntimeApi);
            }
        }
    }

    if config.http.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::EmptyLogLevel);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
