//! proxy-bridge
//!
//! Runs a handler behind one of two transports, chosen at startup.
//!
//! ```text
//!                 CONNECT_SERVER_MODE=http                CONNECT_SERVER_MODE=lambda
//!
//!   client ──TCP──▶ http::server ─┐          Runtime API ──event──▶ lambda::run
//!                                 │                                     │
//!                                 ▼                                     ▼
//!                       Handler + LiveResponse          proxy::materialize → Handler
//!                                 │                       + ResponseBuffer → envelope
//!   client ◀──────────────────────┘          Runtime API ◀──response────┘
//! ```
//!
//! The binary serves the built-in echo handler; embedders call
//! `proxy_bridge::start` with their own.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use proxy_bridge::config::{self, BridgeConfig, LogFormat};
use proxy_bridge::http::EchoHandler;
use proxy_bridge::lifecycle::{self, signals, Shutdown, StartError};
use proxy_bridge::observability::{init_logging, tracing_log};

#[derive(Parser)]
#[command(name = "proxy-bridge")]
#[command(about = "Serve an HTTP handler over a socket or as a proxy-integration Lambda", long_about = None)]
struct Cli {
    /// Optional TOML file with http and observability settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match serve(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Startup errors can happen before the subscriber exists.
            eprintln!("proxy-bridge: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(cli: Cli) -> Result<(), StartError> {
    let mut config: BridgeConfig = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::config_from_env()?,
    };
    if let Some(format) = cli.log_format {
        config.observability.log_format = format;
    }

    init_logging(&config.observability);

    tracing::info!(
        mode = ?config.mode,
        bind_address = ?config.http.bind_address,
        "proxy-bridge v0.1.0 starting"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_watcher(shutdown.clone());

    lifecycle::run(config, Arc::new(EchoHandler), tracing_log(), &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
