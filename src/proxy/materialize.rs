//! Turns an inbound envelope into a synthetic HTTP request.
//!
//! # Responsibilities
//! - Decode the body (base64 when flagged)
//! - Build method and target from `httpMethod` and `path`
//! - Merge single-value and multi-value headers
//!
//! # Design Decisions
//! - The target is `path` as delivered; query-string maps are not folded back
//!   into the URI, the proxy layer already carries what the path needs
//! - Header values are appended, never replaced, so a name present in both
//!   maps keeps every value
//! - Failures are client errors, reported as a 400 envelope by the caller

use std::borrow::Cow;

use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode, Uri};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use thiserror::Error;

use crate::http::InvocationContext;
use crate::proxy::envelope::{error_response, ProxyRequest, ProxyResponse};

/// Why an envelope could not become a request.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("could not decode body as base64: {0}")]
    Body(#[from] base64::DecodeError),

    #[error("could not create request : {0}")]
    Request(String),

    #[error("could not create request : invalid header {0:?}")]
    Header(String),
}

impl MaterializeError {
    /// Message logged through the diagnostic logger.
    pub fn log_message(&self) -> String {
        match self {
            MaterializeError::Body(_) => "could not decode body as base64".to_string(),
            other => other.to_string(),
        }
    }

    /// Client-facing envelope for this failure.
    pub fn to_proxy_response(&self) -> ProxyResponse {
        let msg = match self {
            MaterializeError::Body(_) => "could not decode body",
            MaterializeError::Request(_) => "could not create request, check url and http method",
            MaterializeError::Header(_) => "could not create request, check headers",
        };
        error_response(StatusCode::BAD_REQUEST, msg)
    }
}

/// Build a request from `preq`, bound to `ctx`.
///
/// `preq.request_context` is accepted but not propagated into the request.
pub fn materialize(
    preq: &ProxyRequest,
    ctx: InvocationContext,
) -> Result<Request<Bytes>, MaterializeError> {
    let body = decode_body(preq)?;
    let method = parse_method(&preq.http_method)?;
    let uri = parse_target(&preq.path)?;

    let mut req = Request::new(body);
    *req.method_mut() = method;
    *req.uri_mut() = uri;

    let headers = req.headers_mut();
    for (k, v) in &preq.headers {
        headers.append(header_name(k)?, header_value(k, v)?);
    }
    for (k, values) in &preq.multi_value_headers {
        let name = header_name(k)?;
        for v in values {
            headers.append(name.clone(), header_value(k, v)?);
        }
    }

    // TODO: expose preq.request_context to handlers through an extension
    // once a typed shape for it is settled.
    req.extensions_mut().insert(ctx);

    Ok(req)
}

fn decode_body(preq: &ProxyRequest) -> Result<Bytes, MaterializeError> {
    if preq.is_base64_encoded {
        // Line-wrapped encodings are accepted: CR and LF are not data.
        let encoded: Cow<'_, str> = if preq.body.contains(['\r', '\n']) {
            Cow::Owned(preq.body.replace(['\r', '\n'], ""))
        } else {
            Cow::Borrowed(preq.body.as_str())
        };
        Ok(Bytes::from(STANDARD.decode(encoded.as_bytes())?))
    } else {
        Ok(Bytes::copy_from_slice(preq.body.as_bytes()))
    }
}

fn parse_method(method: &str) -> Result<Method, MaterializeError> {
    // An empty method means GET, as with any HTTP client.
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes())
        .map_err(|e| MaterializeError::Request(format!("invalid method {method:?}: {e}")))
}

fn parse_target(path: &str) -> Result<Uri, MaterializeError> {
    let path = if path.is_empty() { "/" } else { path };
    path.parse::<Uri>()
        .map_err(|e| MaterializeError::Request(format!("parse {path:?}: {e}")))
}

fn header_name(name: &str) -> Result<HeaderName, MaterializeError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| MaterializeError::Header(name.to_string()))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, MaterializeError> {
    HeaderValue::from_str(value).map_err(|_| MaterializeError::Header(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn envelope(method: &str, path: &str) -> ProxyRequest {
        ProxyRequest {
            http_method: method.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn plain_body_is_used_verbatim() {
        let mut preq = envelope("POST", "/items");
        preq.body = "héllo {\"a\":1}".to_string();

        let req = materialize(&preq, InvocationContext::default()).unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri().path(), "/items");
        assert_eq!(req.body().as_ref(), "héllo {\"a\":1}".as_bytes());
    }

    #[test]
    fn base64_body_is_decoded() {
        let mut preq = envelope("PUT", "/blob");
        preq.body = STANDARD.encode([0u8, 1, 2, 255]);
        preq.is_base64_encoded = true;

        let req = materialize(&preq, InvocationContext::default()).unwrap();
        assert_eq!(req.body().as_ref(), &[0u8, 1, 2, 255]);
    }

    #[test]
    fn line_wrapped_base64_body_is_decoded() {
        let raw: Vec<u8> = (0u8..=90).collect();
        let encoded = STANDARD.encode(&raw);
        let (head, tail) = encoded.split_at(76);

        let mut preq = envelope("POST", "/upload");
        preq.body = format!("{head}\r\n{tail}\n");
        preq.is_base64_encoded = true;

        let req = materialize(&preq, InvocationContext::default()).unwrap();
        assert_eq!(req.body().as_ref(), raw.as_slice());
    }

    #[test]
    fn invalid_base64_is_a_client_error() {
        let mut preq = envelope("POST", "/");
        preq.body = "not*base64".to_string();
        preq.is_base64_encoded = true;

        let err = materialize(&preq, InvocationContext::default()).unwrap_err();
        assert!(matches!(err, MaterializeError::Body(_)));
        assert_eq!(err.log_message(), "could not decode body as base64");

        let resp = err.to_proxy_response();
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.decoded_body().unwrap(), b"could not decode body");
    }

    #[test]
    fn invalid_method_is_a_client_error() {
        let preq = envelope("GE T", "/");

        let err = materialize(&preq, InvocationContext::default()).unwrap_err();
        assert!(matches!(err, MaterializeError::Request(_)));
        assert!(err.log_message().starts_with("could not create request : "));

        let resp = err.to_proxy_response();
        assert_eq!(resp.status_code, 400);
        assert_eq!(
            resp.decoded_body().unwrap(),
            b"could not create request, check url and http method"
        );
    }

    #[test]
    fn invalid_path_is_a_client_error() {
        let preq = envelope("GET", "/a b");
        let err = materialize(&preq, InvocationContext::default()).unwrap_err();
        assert!(matches!(err, MaterializeError::Request(_)));
    }

    #[test]
    fn empty_method_and_path_default() {
        let req = materialize(&envelope("", ""), InvocationContext::default()).unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri().path(), "/");
    }

    #[test]
    fn path_carries_its_own_query() {
        let mut preq = envelope("GET", "/search?q=rust");
        preq.query_string_parameters = HashMap::from([("page".to_string(), "2".to_string())]);

        let req = materialize(&preq, InvocationContext::default()).unwrap();
        assert_eq!(req.uri().query(), Some("q=rust"));
    }

    #[test]
    fn query_maps_are_not_reassembled() {
        let mut preq = envelope("GET", "/search");
        preq.query_string_parameters = HashMap::from([("q".to_string(), "rust".to_string())]);

        let req = materialize(&preq, InvocationContext::default()).unwrap();
        assert_eq!(req.uri().query(), None);
    }

    #[test]
    fn headers_from_both_maps_are_kept() {
        let mut preq = envelope("GET", "/");
        preq.headers = HashMap::from([("X".to_string(), "1".to_string())]);
        preq.multi_value_headers =
            HashMap::from([("X".to_string(), vec!["2".to_string(), "3".to_string()])]);

        let req = materialize(&preq, InvocationContext::default()).unwrap();
        let values: Vec<_> = req.headers().get_all("x").iter().collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn duplicates_across_maps_are_not_collapsed() {
        let mut preq = envelope("GET", "/");
        preq.headers = HashMap::from([("Accept".to_string(), "*/*".to_string())]);
        preq.multi_value_headers =
            HashMap::from([("Accept".to_string(), vec!["*/*".to_string()])]);

        let req = materialize(&preq, InvocationContext::default()).unwrap();
        assert_eq!(req.headers().get_all("accept").iter().count(), 2);
    }

    #[test]
    fn invalid_header_name_is_a_client_error() {
        let mut preq = envelope("GET", "/");
        preq.headers = HashMap::from([("bad header".to_string(), "v".to_string())]);

        let err = materialize(&preq, InvocationContext::default()).unwrap_err();
        assert!(matches!(err, MaterializeError::Header(_)));
        assert_eq!(err.to_proxy_response().status_code, 400);
    }

    #[test]
    fn context_is_bound_but_request_context_is_not() {
        let mut preq = envelope("GET", "/");
        preq.request_context =
            HashMap::from([("stage".to_string(), serde_json::json!("prod"))]);
        let ctx = InvocationContext {
            request_id: Some("req-1".to_string()),
            ..Default::default()
        };

        let req = materialize(&preq, ctx.clone()).unwrap();
        assert_eq!(req.extensions().get::<InvocationContext>(), Some(&ctx));
        assert_eq!(req.extensions().len(), 1);
    }
}
