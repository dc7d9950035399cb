//! Serve one HTTP handler either on a socket or as an API Gateway
//! proxy-integration Lambda.

pub mod config;
pub mod http;
pub mod lambda;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::BridgeConfig;
pub use http::{Handler, HttpServer, InvocationContext, ResponseSink};
pub use lifecycle::{start, Shutdown};
pub use observability::DiagnosticLog;
pub use proxy::{ProxyHandler, ProxyRequest, ProxyResponse, ResponseBuffer};
