//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (CONNECT_SERVER_MODE, CONNECT_SERVER_ADDR,
//!       AWS_LAMBDA_RUNTIME_API)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable, read once at startup)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow running with no file at all
//! - The environment alone decides mode, address and runtime API; the file
//!   tunes the rest
//! - Any configuration error is fatal to startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{config_from_env, config_from_lookup, load_config, ConfigError};
pub use schema::{BridgeConfig, HttpConfig, LambdaConfig, LogFormat, Mode, ObservabilityConfig};
pub use validation::{validate_config, ValidationError};
