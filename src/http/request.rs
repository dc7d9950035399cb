//! Per-request context bound to synthetic and live requests.
//!
//! # Responsibilities
//! - Carry the invocation identity and deadline into handlers
//! - Generate and propagate `x-request-id` on socket-served requests
//!
//! # Design Decisions
//! - Context travels in request extensions, so handlers read it with
//!   `req.extensions().get::<InvocationContext>()`
//! - Request IDs are UUID v4

use std::time::{Duration, SystemTime};

use axum::http::{HeaderName, Request};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer,
};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Identity and deadline of the invocation a request belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    /// Transport-assigned ID (Lambda request ID or `x-request-id`).
    pub request_id: Option<String>,
    /// Point in time after which the caller has given up.
    pub deadline: Option<SystemTime>,
    /// X-Ray trace header, when the runtime supplies one.
    pub trace_id: Option<String>,
}

impl InvocationContext {
    /// Time left before the deadline. `None` when no deadline is set,
    /// zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| {
            d.duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO)
        })
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }
}

/// Read the context attached to a request, if any.
pub fn invocation_context<B>(req: &Request<B>) -> Option<&InvocationContext> {
    req.extensions().get::<InvocationContext>()
}

/// Layer that stamps a fresh `x-request-id` on requests missing one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}
