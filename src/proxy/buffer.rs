//! In-memory response capture for proxy invocations.
//!
//! # State Machine
//! ```text
//! Fresh ──write_header / write_body──▶ HeaderCommitted ──write_body──▶ (repeat)
//!   │                                        │
//!   └──────────── to_proxy_response ─────────┴──▶ Rendered
//! ```
//! Rendering a `Fresh` buffer is a handler contract violation; the invocation
//! flow substitutes a synthesized 500 before that can happen.

use std::io;

use axum::http::{HeaderMap, StatusCode};

use crate::http::ResponseSink;
use crate::proxy::envelope::ProxyResponse;

/// Records a handler's header, status and body writes.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: Option<HeaderMap>,
    body: Vec<u8>,
    wrote_header: bool,
    fault: Option<io::ErrorKind>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a status has been committed, explicitly or by a body write.
    pub fn wrote_header(&self) -> bool {
        self.wrote_header
    }

    /// Committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Kind of the first buffering failure, if a write could not be stored.
    pub fn fault(&self) -> Option<io::ErrorKind> {
        self.fault
    }

    /// Render the captured response as an outbound envelope.
    ///
    /// Safe to call repeatedly; the buffer is not consumed.
    pub fn to_proxy_response(&self) -> ProxyResponse {
        let empty = HeaderMap::new();
        ProxyResponse::encode(
            self.status.unwrap_or(StatusCode::OK),
            self.headers.as_ref().unwrap_or(&empty),
            &self.body,
        )
    }
}

impl ResponseSink for ResponseBuffer {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.headers.get_or_insert_with(HeaderMap::new)
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.wrote_header {
            return;
        }
        self.status = Some(status);
        self.wrote_header = true;
    }

    fn write_body(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }

        if let Err(e) = self.body.try_reserve(buf.len()) {
            self.fault.get_or_insert(io::ErrorKind::OutOfMemory);
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, e));
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    #[test]
    fn fresh_buffer_has_not_committed() {
        let buf = ResponseBuffer::new();
        assert!(!buf.wrote_header());
        assert_eq!(buf.status(), None);
        assert!(buf.body().is_empty());
    }

    #[test]
    fn write_without_status_commits_200() {
        let mut buf = ResponseBuffer::new();
        buf.write_body(b"hi").unwrap();

        assert!(buf.wrote_header());
        assert_eq!(buf.to_proxy_response().status_code, 200);
    }

    #[test]
    fn first_status_wins() {
        let mut buf = ResponseBuffer::new();
        buf.write_header(StatusCode::CREATED);
        buf.write_header(StatusCode::NOT_FOUND);
        buf.write_body(b"x").unwrap();
        buf.write_header(StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(buf.to_proxy_response().status_code, 201);
    }

    #[test]
    fn status_after_write_is_ignored() {
        let mut buf = ResponseBuffer::new();
        buf.write_body(b"x").unwrap();
        buf.write_header(StatusCode::ACCEPTED);

        assert_eq!(buf.status(), Some(StatusCode::OK));
    }

    #[test]
    fn header_set_is_shared_across_accesses() {
        let mut buf = ResponseBuffer::new();
        buf.headers_mut().insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        buf.write_body(b"hello").unwrap();
        buf.headers_mut().append(SET_COOKIE, "late=1".parse().unwrap());

        let resp = buf.to_proxy_response();
        assert_eq!(resp.multi_value_headers["Content-Type"], vec!["text/plain"]);
        assert_eq!(resp.multi_value_headers["Set-Cookie"], vec!["late=1"]);
    }

    #[test]
    fn json_content_type_renders_literal_text() {
        let mut buf = ResponseBuffer::new();
        buf.headers_mut()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        buf.write_body(br#"{"a":1}"#).unwrap();

        let resp = buf.to_proxy_response();
        assert!(!resp.is_base64_encoded);
        assert_eq!(resp.body, r#"{"a":1}"#);
    }

    #[test]
    fn other_content_type_renders_base64() {
        let mut buf = ResponseBuffer::new();
        buf.headers_mut().insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        buf.write_body(b"hello").unwrap();

        let resp = buf.to_proxy_response();
        assert!(resp.is_base64_encoded);
        assert_eq!(resp.body, STANDARD.encode("hello"));
    }

    #[test]
    fn missing_content_type_renders_base64() {
        let mut buf = ResponseBuffer::new();
        buf.write_body(&[0xff, 0x00, 0x10]).unwrap();

        let resp = buf.to_proxy_response();
        assert!(resp.is_base64_encoded);
        assert_eq!(resp.decoded_body().unwrap(), vec![0xff, 0x00, 0x10]);
    }

    #[test]
    fn writes_accumulate() {
        let mut buf = ResponseBuffer::new();
        assert_eq!(buf.write_body(b"foo").unwrap(), 3);
        assert_eq!(buf.write_body(b"").unwrap(), 0);
        assert_eq!(buf.write_body(b"bar").unwrap(), 3);

        assert_eq!(buf.body(), b"foobar");
        assert_eq!(buf.fault(), None);
    }

    #[test]
    fn rendering_is_repeatable() {
        let mut buf = ResponseBuffer::new();
        buf.write_header(StatusCode::NO_CONTENT);

        assert_eq!(buf.to_proxy_response(), buf.to_proxy_response());
    }

    #[test]
    fn io_write_through_dyn_sink() {
        use std::io::Write as _;

        let mut buf = ResponseBuffer::new();
        {
            let sink: &mut dyn ResponseSink = &mut buf;
            write!(sink, "{}-{}", 1, 2).unwrap();
        }
        assert_eq!(buf.body(), b"1-2");
    }
}
