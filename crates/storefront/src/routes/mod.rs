//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (app start)
//! GET  /catalog                - Shop section
//! GET  /portfolio              - Portfolio and bonus sections
//! GET  /account                - Owned products (refreshes access)
//! POST /catalog/refresh        - Re-sync the catalog from the gateway
//!
//! # Overlays (HTMX fragments into #overlay)
//! GET  /products/{id}          - Detail modal
//! GET  /products/{id}/secret   - Secret content (owned products only)
//! GET  /checkout/{id}          - Checkout form
//! POST /checkout/{id}          - Submit checkout, show payment frame
//! POST /view/close             - Close the open overlay
//!
//! # Admin
//! GET  /admin                  - Analytics dashboard (admins only)
//!
//! # JSON API
//! GET  /api/products           - Normalized catalog
//! GET  /api/access             - Access of the current visitor
//!
//! # Health
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (catalog loaded)
//! ```

pub mod admin;
pub mod api;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod pages;
pub mod products;
pub mod view;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use sheetshop_core::{AccessGrant, Price, Product, UserIdentity};

use crate::markup::{self, Segment};
use crate::middleware::{create_session_layer, request_id_middleware, security_headers_middleware};
use crate::state::AppState;
use crate::view::Page;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create the overlay routes router.
pub fn overlay_routes() -> Router<AppState> {
    Router::new()
        .route("/products/{id}", get(products::detail))
        .route("/products/{id}/secret", get(products::secret))
        .route("/checkout/{id}", get(checkout::show).post(checkout::submit))
        .route("/view/close", post(view::close))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::products))
        .route("/access", get(api::access))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/catalog", get(pages::catalog))
        .route("/portfolio", get(pages::portfolio))
        .route("/account", get(pages::account))
        .route("/catalog/refresh", post(catalog::refresh))
        .route("/admin", get(admin::dashboard))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(overlay_routes())
        .nest("/api", api_routes())
}

/// The full application with sessions and middleware, minus the outer
/// tracing and Sentry layers added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .with_state(state)
}

// =============================================================================
// Shared view models
// =============================================================================

/// Data every full page needs.
#[derive(Clone)]
pub struct Layout {
    pub title: String,
    pub active: &'static str,
    pub tabs: Vec<NavTab>,
    pub user_name: String,
    pub is_guest: bool,
    pub is_admin: bool,
}

impl Layout {
    #[must_use]
    pub fn new(state: &AppState, identity: &UserIdentity, title: &str, page: Option<Page>) -> Self {
        Self {
            title: title.to_string(),
            active: page.map_or("", Page::as_str),
            tabs: Page::ALL
                .into_iter()
                .map(|tab| NavTab {
                    href: tab.path(),
                    label: tab.title(),
                    active: Some(tab) == page,
                })
                .collect(),
            user_name: identity.display_name(),
            is_guest: identity.is_guest(),
            is_admin: identity
                .user_id()
                .is_some_and(|id| state.config().is_admin(id)),
        }
    }
}

/// One link of the bottom tab bar.
#[derive(Clone)]
pub struct NavTab {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// What the main button of a product card does.
pub mod card_action {
    pub const DETAIL: &str = "detail";
    pub const EXTERNAL: &str = "external";
    pub const CHECKOUT: &str = "checkout";
    pub const SECRET: &str = "secret";
}

/// A product as shown on cards and in overlays.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    /// Percent-encoded ID for building URLs.
    pub path_id: String,
    pub title: String,
    pub summary: String,
    pub category: String,
    pub price: String,
    pub media_url: String,
    pub is_video: bool,
    pub button_text: String,
    pub button_style: String,
    pub action: &'static str,
    pub external_link: String,
    pub owned: bool,
    pub has_secret: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, grant: &AccessGrant, currency: &str) -> Self {
        let owned = grant.grants(&product.id);
        let has_secret = product.has_secret();

        let action = if owned && has_secret {
            card_action::SECRET
        } else if product.use_detail_modal {
            card_action::DETAIL
        } else if !product.external_link.is_empty() {
            card_action::EXTERNAL
        } else {
            card_action::CHECKOUT
        };

        Self {
            id: product.id.to_string(),
            path_id: encode_path_segment(product.id.as_str()),
            title: product.title.clone(),
            summary: summary(&product.description),
            category: product.category.clone(),
            price: price_label(product.price, currency),
            media_url: product.media.url.clone(),
            is_video: product.media.kind == sheetshop_core::MediaKind::Video,
            button_text: product.button.text.clone(),
            button_style: button_style(&product.button.color),
            action,
            external_link: product.external_link.clone(),
            owned,
            has_secret,
        }
    }

    /// Build cards for a list of products.
    #[must_use]
    pub fn list<'a>(
        products: impl IntoIterator<Item = &'a Product>,
        grant: &AccessGrant,
        currency: &str,
    ) -> Vec<Self> {
        products
            .into_iter()
            .map(|p| Self::new(p, grant, currency))
            .collect()
    }
}

/// Price with currency; zero prices read as free.
#[must_use]
pub fn price_label(price: Price, currency: &str) -> String {
    if price.is_zero() {
        "Free".to_string()
    } else {
        format!("{price} {currency}")
    }
}

/// First paragraph of a description, without media directives.
fn summary(description: &str) -> String {
    markup::parse(description)
        .into_iter()
        .find(Segment::is_paragraph)
        .map(|s| s.content().trim().to_string())
        .unwrap_or_default()
}

/// Inline style for a sheet-provided button color.
///
/// Only `#rgb`/`#rrggbb`/`#rrggbbaa` and plain color names pass; anything
/// else yields no style.
fn button_style(color: &str) -> String {
    let color = color.trim();
    let valid = match color.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !color.is_empty() && color.len() <= 24 && color.chars().all(|c| c.is_ascii_alphabetic()),
    };

    if valid {
        format!("background-color: {color}")
    } else {
        String::new()
    }
}

/// Percent-encode one path segment.
#[must_use]
pub fn encode_path_segment(raw: &str) -> String {
    // byte_serialize turns spaces into '+' and escapes literal '+', so the
    // swap below is lossless.
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Media shown in a detail gallery.
#[derive(Clone)]
pub struct GalleryItem {
    pub url: String,
    pub is_video: bool,
}

impl GalleryItem {
    #[must_use]
    pub fn new(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
        let is_video = [".mp4", ".webm", ".mov", ".m4v"]
            .iter()
            .any(|ext| path.ends_with(ext));
        Self {
            url: url.to_string(),
            is_video,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Router fixtures shared by handler tests.

    use std::path::PathBuf;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, Response, header};
    use secrecy::SecretString;
    use url::Url;

    use crate::config::{GatewayConfig, PaymentConfig, StorefrontConfig};
    use crate::middleware::INIT_DATA_HEADER;
    use crate::state::AppState;

    /// Init data claiming user 42 (`@buyer`), who is an admin.
    pub const ADMIN_INIT_DATA: &str =
        "user=%7B%22id%22%3A42%2C%22username%22%3A%22buyer%22%7D&auth_date=1&hash=x";

    /// Init data claiming user 7, who is not an admin.
    pub const USER_INIT_DATA: &str = "user=%7B%22id%22%3A7%7D&auth_date=1&hash=x";

    /// State whose gateway refuses connections.
    #[allow(clippy::unwrap_used)]
    pub fn state(cache_path: Option<PathBuf>) -> AppState {
        AppState::new(StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            gateway: GatewayConfig {
                url: SecretString::from("http://127.0.0.1:9/exec"),
                timeout: Some(Duration::from_secs(2)),
            },
            payment: PaymentConfig {
                base_url: Url::parse("https://pay.example.com/checkout").unwrap(),
            },
            catalog_cache_path: cache_path,
            admin_user_ids: vec![42],
            currency: "₽".to_string(),
            session_idle: Duration::from_secs(600),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        })
        .unwrap()
    }

    #[allow(clippy::unwrap_used)]
    pub fn get(uri: &str, cookie: Option<&str>, init_data: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(init_data) = init_data {
            builder = builder.header(INIT_DATA_HEADER, init_data);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[allow(clippy::unwrap_used)]
    pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// `name=value` of the session cookie set by a response.
    pub fn session_cookie(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(String::from)
    }

    #[allow(clippy::unwrap_used)]
    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
