//! Overlay dismissal.

use axum::{http::StatusCode, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::view::{ViewEvent, ViewMachine};

/// Close the open overlay and return to its base page.
///
/// Answers with an empty body so HTMX clears `#overlay`.
#[instrument(skip_all)]
pub async fn close(session: Session) -> Result<impl IntoResponse> {
    ViewMachine::load(session).await?.fire(ViewEvent::Close).await?;
    Ok((StatusCode::OK, ""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower::ServiceExt;

    use super::super::app;
    use super::super::test_support::{post_form, state};
    use super::*;

    #[tokio::test]
    async fn test_close_without_overlay_is_conflict() {
        let response = app(state(None))
            .oneshot(post_form("/view/close", None, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
