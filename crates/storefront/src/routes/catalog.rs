//! Manual catalog re-sync.

use axum::{
    Json,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::instrument;

use crate::state::AppState;

/// Tells HTMX to reload the page after a swap.
const HX_REFRESH: HeaderName = HeaderName::from_static("hx-refresh");

/// Fetch the catalog again.
///
/// A failed sync answers 503 and leaves the current catalog in place. The
/// failure itself is only logged.
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Response {
    match state.catalog().sync(state.gateway()).await {
        Ok(count) => (
            [(HX_REFRESH, HeaderValue::from_static("true"))],
            Json(json!({ "synced": true, "products": count })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "synced": false })),
        )
            .into_response(),
    }
}
