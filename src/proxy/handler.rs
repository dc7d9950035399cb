//! One proxy invocation: materialize, serve, render.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::{Handler, InvocationContext};
use crate::observability::logging::DiagnosticLog;
use crate::proxy::buffer::ResponseBuffer;
use crate::proxy::envelope::{error_response, ProxyRequest, ProxyResponse};
use crate::proxy::materialize::materialize;

/// Failure of a single invocation. Never a client mistake: those become
/// 4xx envelopes instead.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("could not buffer response body: {0}")]
    Buffer(io::ErrorKind),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl InvocationError {
    /// Short type name reported alongside the message.
    pub fn error_type(&self) -> &'static str {
        match self {
            InvocationError::Buffer(_) => "BufferError",
            InvocationError::Panicked(_) => "HandlerPanic",
        }
    }
}

/// Serves proxy envelopes through a wrapped handler.
#[derive(Clone)]
pub struct ProxyHandler {
    handler: Arc<dyn Handler>,
    log: DiagnosticLog,
}

impl ProxyHandler {
    pub fn new(handler: Arc<dyn Handler>, log: DiagnosticLog) -> Self {
        Self { handler, log }
    }

    /// Handle one envelope.
    ///
    /// Client-side problems (undecodable body, bad method or path) and a
    /// handler that never responded all come back as `Ok` envelopes with a
    /// 4xx/5xx status. `Err` is reserved for faults of this invocation.
    pub fn handle(
        &self,
        ctx: InvocationContext,
        preq: &ProxyRequest,
    ) -> Result<ProxyResponse, InvocationError> {
        let req = match materialize(preq, ctx) {
            Ok(req) => req,
            Err(e) => {
                (self.log)(&e.log_message());
                return Ok(e.to_proxy_response());
            }
        };

        tracing::debug!(
            method = %req.method(),
            path = %req.uri().path(),
            "Serving proxy invocation"
        );

        let mut buf = ResponseBuffer::new();
        let served = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handler.serve_http(req, &mut buf);
        }));
        if let Err(payload) = served {
            return Err(InvocationError::Panicked(panic_message(payload.as_ref())));
        }

        if let Some(kind) = buf.fault() {
            return Err(InvocationError::Buffer(kind));
        }

        if !buf.wrote_header() {
            (self.log)("HTTP handler returned without writing a header or body");
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error",
            ));
        }

        Ok(buf.to_proxy_response())
    }
}

impl std::fmt::Debug for ProxyHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyHandler").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
