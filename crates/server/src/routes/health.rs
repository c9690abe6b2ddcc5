use crate::error::{ServerError, ServerResult};
use crate::state::{ServerMetadata, ServerState};
use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sgi::ProcedureInvoker;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "sgi-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "metadata": ServerMetadata {
            name: "sgi-server",
            version: env!("CARGO_PKG_VERSION"),
            environment: state.config.environment,
            uptime_seconds: uptime_seconds(),
        },
    }))
}

/// Readiness check endpoint
/// Returns 200 once the database answers, 503 otherwise
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    state.facade.invoker().ping().await.map_err(|err| {
        tracing::warn!(error = %err, "readiness probe failed");
        ServerError::Unavailable {
            detail: err.to_string(),
            expose: state.expose_errors(),
        }
    })?;

    Ok(Json(json!({
        "status": "ready",
        "service": "sgi-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "components": {
            "api": "ready",
            "database": "ready",
        }
    })))
}

/// Prometheus metrics endpoint
///
/// Falls back to a JSON uptime report when no recorder is installed.
pub async fn metrics(State(state): State<Arc<ServerState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => Json(json!({ "uptime_seconds": uptime_seconds() })).into_response(),
    }
}
