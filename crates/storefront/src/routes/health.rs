//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" while the server is running. Does not touch the gateway.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Ready once a catalog is in memory, either from the cache file or from
/// the first successful sync.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.catalog().is_loaded() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
