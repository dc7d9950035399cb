//! Lambda mode: drive the handler from proxy-integration events.
//!
//! # Data Flow
//! ```text
//! runtime.rs: GET /runtime/invocation/next
//!     → ProxyRequest (serde_json)
//!     → proxy::ProxyHandler::handle (blocking pool)
//!     → POST /runtime/invocation/{id}/response   (any envelope, 2xx-5xx)
//!     → POST /runtime/invocation/{id}/error      (InvocationError, bad event)
//! ```
//!
//! # Design Decisions
//! - One event at a time, as the runtime API hands them out
//! - A failed invocation is reported and the loop moves on
//! - Runtime API transport errors end the loop; the platform restarts us

pub mod runtime;

pub use runtime::{ErrorReport, Invocation, RuntimeClient, RuntimeError};

use tokio::sync::broadcast;
use tracing::Instrument;

use crate::proxy::{InvocationError, ProxyHandler, ProxyRequest};

/// Poll for events until `shutdown` fires or the runtime API fails.
pub async fn run(
    client: RuntimeClient,
    handler: ProxyHandler,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), RuntimeError> {
    tracing::info!("Lambda invocation loop starting");

    loop {
        let invocation = tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Lambda invocation loop stopped");
                return Ok(());
            }
            next = client.next_invocation() => next?,
        };

        process(&client, &handler, invocation).await?;
    }
}

/// Handle one event and report its outcome.
pub async fn process(
    client: &RuntimeClient,
    handler: &ProxyHandler,
    invocation: Invocation,
) -> Result<(), RuntimeError> {
    let span = tracing::info_span!("invocation", request_id = %invocation.request_id);
    report_outcome(client, handler, invocation).instrument(span).await
}

async fn report_outcome(
    client: &RuntimeClient,
    handler: &ProxyHandler,
    invocation: Invocation,
) -> Result<(), RuntimeError> {
    let request_id = invocation.request_id.clone();
    let preq: ProxyRequest = match serde_json::from_slice(&invocation.body) {
        Ok(preq) => preq,
        Err(e) => {
            tracing::error!(error = %e, "Event is not a proxy request");
            let report = ErrorReport {
                error_message: format!("could not decode proxy request: {e}"),
                error_type: "InvalidEvent".to_string(),
            };
            return client.send_error(&request_id, &report).await;
        }
    };

    let ctx = invocation.context();
    let handler = handler.clone();
    let outcome = tokio::task::spawn_blocking(move || handler.handle(ctx, &preq))
        .await
        .unwrap_or_else(|e| Err(InvocationError::Panicked(e.to_string())));

    match outcome {
        Ok(response) => {
            tracing::debug!(status = response.status_code, "Invocation complete");
            client.send_response(&request_id, &response).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Invocation failed");
            client.send_error(&request_id, &ErrorReport::from(&e)).await
        }
    }
}
