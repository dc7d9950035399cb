//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!
//! Per-request anomalies (bad envelope, silent handler):
//!     → DiagnosticLog callback → tracing::error! by default
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing`, pretty for development, JSON for
//!   log aggregation
//! - The diagnostic callback is injected so embedders and tests can capture it

pub mod logging;

pub use logging::{init_logging, tracing_log, DiagnosticLog};
