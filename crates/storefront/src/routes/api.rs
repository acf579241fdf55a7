//! JSON API.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use sheetshop_core::Product;

use crate::access::Refresh;
use crate::middleware::Identity;
use crate::state::AppState;

/// Response of `GET /api/access`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub user_id: Option<i64>,
    pub guest: bool,
    /// IDs of owned catalog products.
    pub owned: Vec<String>,
    /// Normalized tokens as granted by the gateway.
    pub tokens: Vec<String>,
    pub busy: bool,
    pub refresh: Refresh,
}

/// The normalized catalog.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog().snapshot().as_ref().clone())
}

/// Resolve and report the current visitor's access.
#[instrument(skip_all)]
pub async fn access(State(state): State<AppState>, Identity(identity): Identity) -> impl IntoResponse {
    let access = state.registry().access_state(&identity).await;
    let refresh = state.resolver().refresh(&identity, &access).await;

    let catalog = state.catalog().snapshot();
    let grant = access.grant();

    Json(AccessResponse {
        user_id: identity.user_id(),
        guest: identity.is_guest(),
        owned: grant
            .owned(&catalog)
            .into_iter()
            .map(|p| p.id.to_string())
            .collect(),
        tokens: grant.tokens().into_iter().map(String::from).collect(),
        busy: access.is_busy(),
        refresh,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use sheetshop_core::ProductId;
    use tower::ServiceExt;

    use super::super::app;
    use super::super::test_support::{USER_INIT_DATA, body_text, get, state};
    use super::*;

    #[tokio::test]
    async fn test_products_json() {
        let state = state(None);
        state
            .catalog()
            .replace(vec![Product::new(ProductId::new("p1"), "Course")]);

        let response = app(state).oneshot(get("/api/products", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "Course");
    }

    #[tokio::test]
    async fn test_guest_access() {
        let response = app(state(None)).oneshot(get("/api/access", None, None)).await.unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();

        assert_eq!(body["guest"], true);
        assert_eq!(body["refresh"], "guest");
        assert!(body["owned"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_reports_failure() {
        let response = app(state(None))
            .oneshot(get("/api/access", None, Some(USER_INIT_DATA)))
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();

        assert_eq!(body["userId"], 7);
        assert_eq!(body["refresh"], "failed");
        assert_eq!(body["busy"], false);
    }
}
