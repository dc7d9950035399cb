//! Lambda Runtime API client.
//!
//! Speaks the `2018-06-01` runtime protocol: long-poll for the next event,
//! then post either a response or an error for that event's request ID.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::InvocationContext;
use crate::proxy::{InvocationError, ProxyResponse};

pub const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
pub const DEADLINE_HEADER: &str = "lambda-runtime-deadline-ms";
pub const TRACE_ID_HEADER: &str = "lambda-runtime-trace-id";

/// Errors talking to the runtime API.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("runtime API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("next invocation is missing the Lambda-Runtime-Aws-Request-Id header")]
    MissingRequestId,
}

/// One event handed out by the runtime API.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub request_id: String,
    pub deadline: Option<SystemTime>,
    pub trace_id: Option<String>,
    pub body: Bytes,
}

impl Invocation {
    /// Context bound to the synthetic request built for this event.
    pub fn context(&self) -> InvocationContext {
        InvocationContext {
            request_id: Some(self.request_id.clone()),
            deadline: self.deadline,
            trace_id: self.trace_id.clone(),
        }
    }
}

/// Body posted to the error endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_message: String,
    pub error_type: String,
}

impl From<&InvocationError> for ErrorReport {
    fn from(err: &InvocationError) -> Self {
        Self {
            error_message: err.to_string(),
            error_type: err.error_type().to_string(),
        }
    }
}

/// Thin client over the runtime API endpoints.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: Client,
    base_url: String,
}

impl RuntimeClient {
    /// `runtime_api` is the `host:port` from `AWS_LAMBDA_RUNTIME_API`.
    pub fn new(runtime_api: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("http://{}/2018-06-01", runtime_api.trim()),
        }
    }

    /// Block until the next event is available.
    pub async fn next_invocation(&self) -> Result<Invocation, RuntimeError> {
        let resp = self
            .client
            .get(format!("{}/runtime/invocation/next", self.base_url))
            .send()
            .await?;
        let resp = check(resp).await?;

        let headers = resp.headers();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let request_id = header(REQUEST_ID_HEADER).ok_or(RuntimeError::MissingRequestId)?;
        let deadline = header(DEADLINE_HEADER)
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(|ms| UNIX_EPOCH + Duration::from_millis(ms));
        let trace_id = header(TRACE_ID_HEADER);

        let body = resp.bytes().await?;
        Ok(Invocation {
            request_id,
            deadline,
            trace_id,
            body,
        })
    }

    /// Report a successful result for `request_id`.
    pub async fn send_response(
        &self,
        request_id: &str,
        response: &ProxyResponse,
    ) -> Result<(), RuntimeError> {
        let resp = self
            .client
            .post(format!(
                "{}/runtime/invocation/{}/response",
                self.base_url, request_id
            ))
            .json(response)
            .send()
            .await?;
        check(resp).await.map(drop)
    }

    /// Report a failed invocation for `request_id`.
    pub async fn send_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), RuntimeError> {
        let resp = self
            .client
            .post(format!(
                "{}/runtime/invocation/{}/error",
                self.base_url, request_id
            ))
            .header("Lambda-Runtime-Function-Error-Type", &report.error_type)
            .json(report)
            .send()
            .await?;
        check(resp).await.map(drop)
    }
}

async fn check(resp: Response) -> Result<Response, RuntimeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RuntimeError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_uses_api_version() {
        let client = RuntimeClient::new(" 127.0.0.1:9001 ");
        assert_eq!(client.base_url, "http://127.0.0.1:9001/2018-06-01");
    }

    #[test]
    fn error_report_from_invocation_error() {
        let err = InvocationError::Panicked("boom".into());
        let report = ErrorReport::from(&err);
        assert_eq!(report.error_type, "HandlerPanic");
        assert_eq!(report.error_message, "handler panicked: boom");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errorMessage"], "handler panicked: boom");
        assert_eq!(json["errorType"], "HandlerPanic");
    }

    #[test]
    fn buffer_fault_is_reported_as_buffer_error() {
        let err = InvocationError::Buffer(std::io::ErrorKind::OutOfMemory);
        let report = ErrorReport::from(&err);
        assert_eq!(report.error_type, "BufferError");
        assert_eq!(report.error_message, "could not buffer response body: out of memory");
    }

    #[test]
    fn invocation_context_carries_runtime_headers() {
        let invocation = Invocation {
            request_id: "id-1".into(),
            deadline: Some(UNIX_EPOCH + Duration::from_millis(1_700_000_000_000)),
            trace_id: Some("Root=1-abc".into()),
            body: Bytes::new(),
        };
        let ctx = invocation.context();
        assert_eq!(ctx.request_id.as_deref(), Some("id-1"));
        assert_eq!(ctx.trace_id.as_deref(), Some("Root=1-abc"));
        assert!(ctx.is_expired());
    }
}
