//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Transport selection (`mode`, `http.bind_address`, `lambda.runtime_api`)
//! is read from the environment only and skipped by the file format.

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Which transport drives the handler. Set from `CONNECT_SERVER_MODE`.
    #[serde(skip)]
    pub mode: Mode,

    /// Settings for serving real HTTP connections.
    pub http: HttpConfig,

    /// Settings for the Lambda invocation loop.
    pub lambda: LambdaConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Transport mode, selected once at process start.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Accept HTTP/1.1 and cleartext HTTP/2 connections on `http.bind_address`.
    #[default]
    Http,
    /// Receive proxy envelopes from the Lambda Runtime API.
    Lambda,
}

/// HTTP mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). Required in HTTP mode.
    /// Set from `CONNECT_SERVER_ADDR`.
    #[serde(skip)]
    pub bind_address: Option<String>,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: None,
            max_body_bytes: 6 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Lambda mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct LambdaConfig {
    /// `host:port` of the Lambda Runtime API. Required in Lambda mode.
    /// Set from `AWS_LAMBDA_RUNTIME_API`.
    #[serde(skip)]
    pub runtime_api: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directives when `RUST_LOG` is unset.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "proxy_bridge=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
