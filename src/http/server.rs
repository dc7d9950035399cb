//! HTTP mode: serve the wrapped handler on a real socket.
//!
//! # Responsibilities
//! - Create the axum router that sends every request to the handler
//! - Serve HTTP/1.1 and cleartext HTTP/2 (prior knowledge) on one listener
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Run the synchronous handler off the async workers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::HttpConfig;
use crate::http::request::{
    propagate_request_id_layer, set_request_id_layer, InvocationContext, X_REQUEST_ID,
};
use crate::http::response::LiveResponse;
use crate::http::Handler;
use crate::observability::DiagnosticLog;

/// Application state injected into the fallback route.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn Handler>,
    pub log: DiagnosticLog,
    pub max_body_bytes: usize,
}

/// HTTP server for socket mode.
pub struct HttpServer {
    router: Router,
    config: HttpConfig,
}

impl HttpServer {
    /// Create a server that hands every request to `handler`.
    pub fn new(config: HttpConfig, handler: Arc<dyn Handler>, log: DiagnosticLog) -> Self {
        let state = AppState {
            handler,
            log,
            max_body_bytes: config.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &HttpConfig, state: AppState) -> Router {
        Router::new()
            .fallback(serve_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Accept connections on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_body_bytes = self.config.max_body_bytes,
            request_timeout_secs = self.config.request_timeout_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Collect the body, run the handler, and send back what it wrote.
async fn serve_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, path = %parts.uri.path(), "Failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    parts.extensions.insert(InvocationContext {
        request_id,
        ..Default::default()
    });
    let req = Request::from_parts(parts, bytes);

    let handler = state.handler.clone();
    let served = tokio::task::spawn_blocking(move || {
        let mut resp = LiveResponse::new();
        handler.serve_http(req, &mut resp);
        resp
    })
    .await;

    match served {
        Ok(resp) => {
            if let Some(kind) = resp.fault() {
                (state.log)(&format!("HTTP handler response could not be buffered: {kind}"));
            }
            resp.into_response()
        }
        Err(e) => {
            (state.log)(&format!("HTTP handler failed: {e}"));
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}
