//! Startup orchestration.
//!
//! # Responsibilities
//! - Read and validate configuration
//! - Select the transport for this process
//! - Run it until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and nothing is served
//! - The signal watcher starts before the transport so no signal is missed

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{config_from_env, validate_config, BridgeConfig, ConfigError, Mode, ValidationError};
use crate::http::{Handler, HttpServer};
use crate::lambda::{self, RuntimeClient, RuntimeError};
use crate::lifecycle::signals::spawn_signal_watcher;
use crate::lifecycle::Shutdown;
use crate::observability::DiagnosticLog;
use crate::proxy::ProxyHandler;

/// Errors that stop the process from serving.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("could not start handler : {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {address} : {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start http server : {0}")]
    Serve(#[source] std::io::Error),

    #[error("lambda runtime failed : {0}")]
    Runtime(#[from] RuntimeError),
}

/// Serve `handler` in whichever mode the environment selects.
///
/// `CONNECT_SERVER_MODE` is `lambda` or `http` (the default). HTTP mode
/// also needs `CONNECT_SERVER_ADDR`, the address to listen on; Lambda mode
/// needs `AWS_LAMBDA_RUNTIME_API`, which the platform always sets.
pub async fn start(handler: Arc<dyn Handler>, log: DiagnosticLog) -> Result<(), StartError> {
    let config = config_from_env()?;
    let shutdown = Shutdown::new();
    spawn_signal_watcher(shutdown.clone());
    run(config, handler, log, &shutdown).await
}

/// Serve `handler` with an already loaded configuration.
pub async fn run(
    config: BridgeConfig,
    handler: Arc<dyn Handler>,
    log: DiagnosticLog,
    shutdown: &Shutdown,
) -> Result<(), StartError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    match config.mode {
        Mode::Http => {
            let Some(address) = config.http.bind_address.clone() else {
                return Err(ConfigError::Validation(vec![ValidationError::MissingBindAddress]).into());
            };
            let listener = TcpListener::bind(&address)
                .await
                .map_err(|source| StartError::Bind {
                    address: address.clone(),
                    source,
                })?;

            let server = HttpServer::new(config.http, handler, log);
            server
                .run(listener, shutdown.subscribe())
                .await
                .map_err(StartError::Serve)
        }
        Mode::Lambda => {
            let runtime_api = config.lambda.runtime_api.unwrap_or_default();
            tracing::info!(runtime_api = %runtime_api, "Registering as proxy-invocation handler");

            let client = RuntimeClient::new(&runtime_api);
            let handler = ProxyHandler::new(handler, log);
            lambda::run(client, handler, shutdown.subscribe()).await?;
            Ok(())
        }
    }
}
