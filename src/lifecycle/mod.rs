//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Read env (+ optional file) → Validate → Select mode
//!     → HTTP server  or  Lambda invocation loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting / polling → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal before anything is served
//! - Mode is chosen once per process and never changes

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, start, StartError};
