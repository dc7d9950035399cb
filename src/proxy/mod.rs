//! Proxy-integration translation layer.
//!
//! # Data Flow
//! ```text
//! ProxyRequest (JSON envelope)
//!     → materialize.rs (body decode, method/target, header merge)
//!     → Handler::serve_http(request, ResponseBuffer)
//!     → buffer.rs (status commit, header set, body bytes)
//!     → ProxyResponse (JSON envelope, base64 unless application/json)
//! ```
//!
//! # Design Decisions
//! - Every invocation is independent; nothing here is shared between calls
//! - Client mistakes and silent handlers become well-formed 4xx/5xx envelopes
//! - Only faults of the invocation itself surface as `InvocationError`

pub mod buffer;
pub mod envelope;
pub mod handler;
pub mod materialize;

pub use buffer::ResponseBuffer;
pub use envelope::{error_response, ProxyRequest, ProxyResponse};
pub use handler::{InvocationError, ProxyHandler};
pub use materialize::{materialize, MaterializeError};
