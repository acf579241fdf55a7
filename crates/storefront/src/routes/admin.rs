//! Analytics dashboard for operators.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::gateway::conversions::{DashboardSummary, convert_stats};
use crate::middleware::Identity;
use crate::state::AppState;

use super::{Layout, price_label};

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub summary: DashboardSummary,
    pub revenue: String,
    pub stats_unavailable: bool,
    pub catalog_size: usize,
}

/// Dashboard page handler.
///
/// Anyone not listed as an admin gets a 404, so the page's existence is not
/// advertised. A failed `getStats` call renders an empty dashboard.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<impl IntoResponse> {
    let is_admin = identity
        .user_id()
        .is_some_and(|id| state.config().is_admin(id));
    if !is_admin {
        return Err(AppError::NotFound("page".to_string()));
    }

    let (summary, stats_unavailable) = match state.gateway().get_stats().await {
        Ok(stats) => (convert_stats(&stats), false),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch stats; showing empty dashboard");
            (DashboardSummary::default(), true)
        }
    };

    Ok(DashboardTemplate {
        layout: Layout::new(&state, &identity, "Dashboard", None),
        revenue: price_label(summary.revenue, &state.config().currency),
        summary,
        stats_unavailable,
        catalog_size: state.catalog().snapshot().len(),
    })
}
