//! The response-writer capability handed to wrapped handlers.
//!
//! # Responsibilities
//! - Define the header / status / body surface a handler writes through
//! - Define the handler entry point shared by both transport modes
//!
//! # Design Decisions
//! - One trait, two implementations: `LiveResponse` for socket-served
//!   requests, `ResponseBuffer` for proxy invocations
//! - The first status commit wins; later commits are ignored
//! - A body write without an explicit status commits 200

use std::io;

use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;

/// Sink a handler writes its response into.
pub trait ResponseSink {
    /// Mutable header set. Changes made after the status commit are still
    /// visible to the transport.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status code. Ignored once a status has been committed.
    fn write_header(&mut self, status: StatusCode);

    /// Append body bytes, committing 200 first if nothing was committed.
    fn write_body(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl io::Write for dyn ResponseSink + '_ {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A synchronous HTTP handler.
///
/// Invoked once per request with the request and a fresh sink. Nothing is
/// returned; everything the handler has to say goes through the sink.
pub trait Handler: Send + Sync + 'static {
    fn serve_http(&self, req: Request<Bytes>, w: &mut dyn ResponseSink);
}

impl<F> Handler for F
where
    F: Fn(Request<Bytes>, &mut dyn ResponseSink) + Send + Sync + 'static,
{
    fn serve_http(&self, req: Request<Bytes>, w: &mut dyn ResponseSink) {
        self(req, w)
    }
}

/// Handler that echoes the request method, path and body back as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn serve_http(&self, req: Request<Bytes>, w: &mut dyn ResponseSink) {
        use std::io::Write as _;

        w.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("text/plain"),
        );
        w.write_header(StatusCode::OK);
        // A failed write faults the sink; both transports turn that into an error.
        let _ = writeln!(w, "{} {}", req.method(), req.uri());
        let _ = w.write_body(req.body());
    }
}
