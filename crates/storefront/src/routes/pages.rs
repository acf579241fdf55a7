//! Primary page handlers.
//!
//! Every page entry is a `Navigate` transition (dismissing any overlay) and
//! a `session` ping.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use sheetshop_core::{Section, UserIdentity};

use crate::access::Refresh;
use crate::error::Result;
use crate::middleware::Identity;
use crate::state::AppState;
use crate::view::{Page, ViewEvent, ViewMachine};

use super::{Layout, ProductCard};

/// Products featured on the home page.
const FEATURED: usize = 4;

#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub featured: Vec<ProductCard>,
    pub shop_count: usize,
    pub portfolio_count: usize,
    pub owned_count: usize,
    pub catalog_ready: bool,
}

/// Shop and portfolio listings.
#[derive(Template, WebTemplate)]
#[template(path = "pages/listing.html")]
pub struct ListingTemplate {
    pub layout: Layout,
    pub heading: String,
    pub products: Vec<ProductCard>,
    pub catalog_ready: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/account.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub is_guest: bool,
    pub refresh_failed: bool,
}

/// Record the page entry: view transition plus telemetry.
async fn enter(state: &AppState, session: Session, identity: &UserIdentity, page: Page) -> Result<()> {
    ViewMachine::load(session).await?.fire(ViewEvent::Navigate(page)).await?;
    state.telemetry().session(identity, page.as_str());
    Ok(())
}

/// Home page; opening the app lands here.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
) -> Result<impl IntoResponse> {
    enter(&state, session, &identity, Page::Home).await?;

    let access = state.registry().access_state(&identity).await;
    state.resolver().refresh(&identity, &access).await;
    let grant = access.grant();

    let catalog = state.catalog().snapshot();
    let currency = &state.config().currency;
    let shop: Vec<_> = catalog.iter().filter(|p| p.section == Section::Shop).collect();

    Ok(HomeTemplate {
        layout: Layout::new(&state, &identity, Page::Home.title(), Some(Page::Home)),
        featured: ProductCard::list(shop.iter().take(FEATURED).copied(), &grant, currency),
        shop_count: shop.len(),
        portfolio_count: catalog.iter().filter(|p| p.section != Section::Shop).count(),
        owned_count: grant.owned(&catalog).len(),
        catalog_ready: state.catalog().is_loaded(),
    })
}

/// Shop section.
#[instrument(skip_all)]
pub async fn catalog(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
) -> Result<impl IntoResponse> {
    listing(&state, session, &identity, Page::Catalog, &[Section::Shop]).await
}

/// Portfolio and bonus sections.
#[instrument(skip_all)]
pub async fn portfolio(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
) -> Result<impl IntoResponse> {
    listing(
        &state,
        session,
        &identity,
        Page::Portfolio,
        &[Section::Portfolio, Section::Bonus],
    )
    .await
}

async fn listing(
    state: &AppState,
    session: Session,
    identity: &UserIdentity,
    page: Page,
    sections: &[Section],
) -> Result<ListingTemplate> {
    enter(state, session, identity, page).await?;

    let grant = state.registry().access_state(identity).await.grant();
    let products = state.catalog().by_sections(sections);

    Ok(ListingTemplate {
        layout: Layout::new(state, identity, page.title(), Some(page)),
        heading: page.title().to_string(),
        products: ProductCard::list(&products, &grant, &state.config().currency),
        catalog_ready: state.catalog().is_loaded(),
    })
}

/// Owned products. Always refreshes access first.
#[instrument(skip_all)]
pub async fn account(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
) -> Result<impl IntoResponse> {
    enter(&state, session, &identity, Page::Account).await?;

    let access = state.registry().access_state(&identity).await;
    let outcome = state.resolver().refresh(&identity, &access).await;

    let catalog = state.catalog().snapshot();
    let grant = access.grant();

    Ok(AccountTemplate {
        layout: Layout::new(&state, &identity, Page::Account.title(), Some(Page::Account)),
        products: ProductCard::list(grant.owned(&catalog), &grant, &state.config().currency),
        is_guest: identity.is_guest(),
        refresh_failed: outcome == Refresh::Failed,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use sheetshop_core::{Product, ProductId};
    use tower::ServiceExt;

    use super::super::app;
    use super::super::test_support::{body_text, get, session_cookie, state};
    use super::*;

    fn product(id: &str, title: &str, section: Section) -> Product {
        let mut product = Product::new(ProductId::new(id), title);
        product.section = section;
        product
    }

    #[tokio::test]
    async fn test_pages_render_sections() {
        let state = state(None);
        state.catalog().replace(vec![
            product("a", "Shop Course", Section::Shop),
            product("b", "Case Study", Section::Portfolio),
            product("c", "Bonus Pack", Section::Bonus),
        ]);
        let app = app(state.clone());

        let response = app.clone().oneshot(get("/catalog", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Shop Course"));
        assert!(!html.contains("Case Study"));
        assert!(html.contains(r#"<a href="/catalog" class="active">Catalog</a>"#));
        assert!(html.contains(r#"<a href="/account" class="">My purchases</a>"#));

        let response = app.clone().oneshot(get("/portfolio", None, None)).await.unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Case Study"));
        assert!(html.contains("Bonus Pack"));
        assert!(!html.contains("Shop Course"));

        assert_eq!(state.telemetry().dispatched().sessions, 2);
    }

    #[tokio::test]
    async fn test_home_sets_session_cookie() {
        let app = app(state(None));
        let response = app.oneshot(get("/", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(session_cookie(&response).is_some());
    }

    #[tokio::test]
    async fn test_account_for_guest() {
        let app = app(state(None));
        let response = app.oneshot(get("/account", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Open the store from Telegram"));
    }
}
