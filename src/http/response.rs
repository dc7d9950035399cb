//! Response sink for socket-served requests.
//!
//! # Responsibilities
//! - Record a handler's writes for a live connection
//! - Convert them into an axum response
//!
//! # Design Decisions
//! - Bodies are collected whole and sent with a `Content-Length`; chunked
//!   streaming is not supported
//! - A handler that writes nothing produces an empty 200, as any HTTP server
//!   would; only proxy invocations treat that as a contract violation
//! - A write that could not be stored faults the response; a faulted
//!   response is sent as a 500 rather than a truncated body

use std::io;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::ResponseSink;

/// Live-connection counterpart of the proxy `ResponseBuffer`.
#[derive(Debug, Default)]
pub struct LiveResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
    fault: Option<io::ErrorKind>,
}

impl LiveResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the status is fixed.
    pub fn committed(&self) -> bool {
        self.committed
    }

    /// Kind of the first buffering failure, if a write could not be stored.
    pub fn fault(&self) -> Option<io::ErrorKind> {
        self.fault
    }
}

impl ResponseSink for LiveResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            return;
        }
        self.status = status;
        self.committed = true;
    }

    fn write_body(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.committed {
            self.write_header(StatusCode::OK);
        }
        if let Err(e) = self.body.try_reserve(buf.len()) {
            self.fault.get_or_insert(io::ErrorKind::OutOfMemory);
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, e));
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl IntoResponse for LiveResponse {
    fn into_response(self) -> Response {
        if self.fault.is_some() {
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response();
        }
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
