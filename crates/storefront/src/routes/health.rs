//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};
use safeuse_backend::paths;

use crate::state::AppState;

/// Liveness: the process is serving requests.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: the backend answers an uncached read.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().get_json(paths::ADVICE, None).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
