//! Product overlays: detail modal and secret content.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use sheetshop_core::Product;

use crate::error::{AppError, Result};
use crate::markup::{self, Segment};
use crate::middleware::Identity;
use crate::state::AppState;
use crate::view::{ViewEvent, ViewMachine};

use super::{GalleryItem, ProductCard};

#[derive(Template, WebTemplate)]
#[template(path = "overlays/detail.html")]
pub struct DetailTemplate {
    pub card: ProductCard,
    pub segments: Vec<Segment>,
    pub gallery: Vec<GalleryItem>,
}

#[derive(Template, WebTemplate)]
#[template(path = "overlays/secret.html")]
pub struct SecretTemplate {
    pub title: String,
    pub segments: Vec<Segment>,
    pub external_link: String,
}

/// Look up a product or fail with 404.
pub(super) fn find_product(state: &AppState, id: &str) -> Result<Product> {
    state
        .catalog()
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Detail modal.
#[instrument(skip(state, identity, session))]
pub async fn detail(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = find_product(&state, &id)?;
    ViewMachine::load(session)
        .await?
        .fire(ViewEvent::OpenDetail(product.id.clone()))
        .await?;

    let grant = state.registry().access_state(&identity).await.grant();

    Ok(DetailTemplate {
        card: ProductCard::new(&product, &grant, &state.config().currency),
        segments: markup::parse(product.detail_text()),
        gallery: product.gallery.iter().map(|url| GalleryItem::new(url)).collect(),
    })
}

/// Secret content; only owners see it, everyone else gets 404.
#[instrument(skip(state, identity, session))]
pub async fn secret(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = find_product(&state, &id)?;
    let grant = state.registry().access_state(&identity).await.grant();

    if !product.has_secret() || !grant.grants(&product.id) {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    ViewMachine::load(session)
        .await?
        .fire(ViewEvent::OpenSecret(product.id.clone()))
        .await?;

    Ok(SecretTemplate {
        title: product.title.clone(),
        segments: markup::parse(&product.secret_content),
        external_link: product.external_link,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use sheetshop_core::{AccessGrant, ProductId};
    use tower::ServiceExt;

    use super::super::app;
    use super::super::test_support::{USER_INIT_DATA, body_text, get, post_form, session_cookie, state};
    use super::*;

    fn catalog() -> Vec<Product> {
        let mut course = Product::new(ProductId::new("course"), "Course");
        course.description = "Short".to_string();
        course.full_description = "Intro [[image:https://cdn.example.com/a.png]] Outro".to_string();
        course.secret_content = "The password is swordfish".to_string();
        vec![course]
    }

    #[tokio::test]
    async fn test_detail_renders_markup() {
        let state = state(None);
        state.catalog().replace(catalog());
        let response = app(state).oneshot(get("/products/COURSE", None, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Intro"));
        assert!(html.contains(r#"src="https://cdn.example.com/a.png""#));
        assert!(!html.contains("swordfish"));
    }

    #[tokio::test]
    async fn test_unknown_product_is_404() {
        let state = state(None);
        let response = app(state).oneshot(get("/products/nope", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_secret_hidden_from_non_owner() {
        let state = state(None);
        state.catalog().replace(catalog());
        let response = app(state)
            .oneshot(get("/products/course/secret", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_secret_shown_to_owner() {
        let state = state(None);
        state.catalog().replace(catalog());

        // Seed the user's grant as if a refresh had applied it.
        let identity = crate::middleware::parse_init_data(USER_INIT_DATA)
            .map(sheetshop_core::UserIdentity::Telegram)
            .unwrap();
        let access = state.registry().access_state(&identity).await;
        let resolver = crate::access::AccessResolver::new(FixedGrant(AccessGrant::from_tokens(["course"])));
        resolver.refresh(&identity, &access).await;

        let response = app(state)
            .oneshot(get("/products/course/secret", None, Some(USER_INIT_DATA)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("swordfish"));
    }

    #[tokio::test]
    async fn test_second_overlay_is_conflict() {
        let state = state(None);
        state.catalog().replace(catalog());
        let app = app(state);

        let response = app.clone().oneshot(get("/products/course", None, None)).await.unwrap();
        let cookie = session_cookie(&response).unwrap();

        let response = app
            .clone()
            .oneshot(get("/products/course", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(post_form("/view/close", Some(&cookie), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get("/products/course", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    struct FixedGrant(AccessGrant);

    impl crate::access::AccessSource for FixedGrant {
        async fn fetch_access(
            &self,
            _user: &sheetshop_core::TelegramUser,
        ) -> std::result::Result<AccessGrant, crate::gateway::GatewayError> {
            Ok(self.0.clone())
        }
    }
}
