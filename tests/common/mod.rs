//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use proxy_bridge::DiagnosticLog;
use tokio::net::TcpListener;

/// Diagnostic logger that records every line it is given.
#[allow(dead_code)]
pub fn capture_log() -> (DiagnosticLog, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    let log: DiagnosticLog = Arc::new(move |msg: &str| sink.lock().unwrap().push(msg.to_string()));
    (log, lines)
}

/// What the function posted back for one event.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Posted {
    pub request_id: String,
    pub kind: &'static str,
    pub error_type: Option<String>,
    pub body: serde_json::Value,
}

/// In-process stand-in for the Lambda Runtime API.
#[derive(Default)]
pub struct MockRuntime {
    events: Mutex<VecDeque<(String, String)>>,
    posted: Mutex<Vec<Posted>>,
}

#[allow(dead_code)]
impl MockRuntime {
    pub fn push_event(&self, request_id: &str, body: &str) {
        self.events
            .lock()
            .unwrap()
            .push_back((request_id.to_string(), body.to_string()));
    }

    pub fn posted(&self) -> Vec<Posted> {
        self.posted.lock().unwrap().clone()
    }

    /// Wait until `n` results have been posted, or give up after 5 seconds.
    pub async fn wait_for(&self, n: usize) -> Vec<Posted> {
        for _ in 0..100 {
            let posted = self.posted();
            if posted.len() >= n {
                return posted;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.posted()
    }
}

/// Start a mock runtime API on an ephemeral port.
#[allow(dead_code)]
pub async fn start_mock_runtime() -> (SocketAddr, Arc<MockRuntime>) {
    let runtime = Arc::new(MockRuntime::default());
    let app = Router::new()
        .route("/2018-06-01/runtime/invocation/next", get(next_event))
        .route("/2018-06-01/runtime/invocation/{id}/response", post(post_response))
        .route("/2018-06-01/runtime/invocation/{id}/error", post(post_error))
        .with_state(runtime.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, runtime)
}

async fn next_event(State(runtime): State<Arc<MockRuntime>>) -> Response {
    loop {
        let next = runtime.events.lock().unwrap().pop_front();
        if let Some((id, body)) = next {
            let deadline = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_millis()
                + 30_000;
            return (
                [
                    ("Lambda-Runtime-Aws-Request-Id", id),
                    ("Lambda-Runtime-Deadline-Ms", deadline.to_string()),
                    ("Lambda-Runtime-Trace-Id", "Root=1-test".to_string()),
                ],
                body,
            )
                .into_response();
        }
        // Long-poll like the real API.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn post_response(
    State(runtime): State<Arc<MockRuntime>>,
    Path(id): Path<String>,
    body: Bytes,
) -> StatusCode {
    record(&runtime, id, "response", None, &body);
    StatusCode::ACCEPTED
}

async fn post_error(
    State(runtime): State<Arc<MockRuntime>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let error_type = headers
        .get("Lambda-Runtime-Function-Error-Type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    record(&runtime, id, "error", error_type, &body);
    StatusCode::ACCEPTED
}

fn record(runtime: &MockRuntime, request_id: String, kind: &'static str, error_type: Option<String>, body: &[u8]) {
    let body = serde_json::from_slice(body).unwrap_or(serde_json::Value::Null);
    runtime.posted.lock().unwrap().push(Posted {
        request_id,
        kind,
        error_type,
        body,
    });
}
