//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP mode:
//!     TCP connection (HTTP/1.1 or h2c)
//!     → server.rs (axum, middleware, body collection)
//!     → request.rs (request ID, InvocationContext)
//!     → Handler::serve_http(request, LiveResponse)
//!     → response.rs (LiveResponse → axum Response)
//!     → Send to client
//!
//! Lambda mode:
//!     → proxy::ProxyHandler drives the same Handler with a ResponseBuffer
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod sink;

pub use request::{invocation_context, InvocationContext, X_REQUEST_ID};
pub use response::LiveResponse;
pub use server::HttpServer;
pub use sink::{EchoHandler, Handler, ResponseSink};
