//! Integration test harness for the Sheetshop storefront.
//!
//! Each test gets its own in-process mock gateway and storefront, both bound
//! to ephemeral ports, so nothing external has to be running:
//!
//! ```rust,ignore
//! let gateway = MockGateway::start().await;
//! gateway.set_products(json!([{"id": "p1", "title": "Course"}]));
//!
//! let ctx = TestContext::start(&gateway).await;
//! ctx.sync_catalog().await;
//! let html = ctx.get("/catalog").await.text().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use reqwest::Client;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use sheetshop_storefront::config::{GatewayConfig, PaymentConfig, StorefrontConfig};
use sheetshop_storefront::middleware::INIT_DATA_HEADER;
use sheetshop_storefront::routes;
use sheetshop_storefront::state::AppState;

/// Telegram id of the admin user in [`ADMIN_INIT_DATA`].
pub const ADMIN_ID: i64 = 1;

/// Init data for `@admin` (id 1).
pub const ADMIN_INIT_DATA: &str =
    "user=%7B%22id%22%3A1%2C%22username%22%3A%22admin%22%7D&auth_date=1&hash=x";

/// Init data for `@buyer` (id 7, first name Ann).
pub const BUYER_INIT_DATA: &str = "user=%7B%22id%22%3A7%2C%22username%22%3A%22buyer%22%2C%22first_name%22%3A%22Ann%22%7D&auth_date=1&hash=x";

/// Payment page the storefront falls back to.
pub const PAYMENT_BASE: &str = "https://pay.example.com/checkout";

#[derive(Default)]
struct GatewayData {
    products: Value,
    products_status: Option<StatusCode>,
    access: HashMap<String, Value>,
    stats: Value,
    events: Vec<Value>,
}

/// A spreadsheet gateway stand-in that serves canned reads and records pings.
#[derive(Clone)]
pub struct MockGateway {
    addr: SocketAddr,
    data: Arc<Mutex<GatewayData>>,
}

impl MockGateway {
    /// Start the mock on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let data = Arc::new(Mutex::new(GatewayData {
            products: json!([]),
            stats: json!({"sessions": [], "leads": []}),
            ..GatewayData::default()
        }));

        let app = Router::new()
            .route("/exec", get(read_action).post(record_event))
            .with_state(Arc::clone(&data));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock gateway");
        let addr = listener.local_addr().expect("Mock gateway has no address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, data }
    }

    /// Webhook URL to configure the storefront with.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/exec", self.addr)
    }

    fn with<T>(&self, f: impl FnOnce(&mut GatewayData) -> T) -> T {
        f(&mut self.data.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Rows returned by `getProducts`.
    pub fn set_products(&self, rows: Value) {
        self.with(|d| d.products = rows);
    }

    /// Make `getProducts` fail with `status` (`None` restores success).
    pub fn fail_products(&self, status: Option<StatusCode>) {
        self.with(|d| d.products_status = status);
    }

    /// Body returned by `getUserAccess` for one user.
    pub fn set_access(&self, user_id: i64, body: Value) {
        self.with(|d| d.access.insert(user_id.to_string(), body));
    }

    /// Body returned by `getStats`.
    pub fn set_stats(&self, body: Value) {
        self.with(|d| d.stats = body);
    }

    /// Every ping received so far.
    #[must_use]
    pub fn events(&self) -> Vec<Value> {
        self.with(|d| d.events.clone())
    }

    /// Pings of one `type`.
    #[must_use]
    pub fn events_of(&self, kind: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|e| e["type"] == kind)
            .collect()
    }

    /// Wait until at least `count` pings of `kind` have arrived.
    ///
    /// Pings are fire-and-forget, so tests poll for them.
    pub async fn wait_for(&self, kind: &str, count: usize) -> Vec<Value> {
        for _ in 0..100 {
            let events = self.events_of(kind);
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.events_of(kind)
    }
}

async fn read_action(
    State(data): State<Arc<Mutex<GatewayData>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let data = data.lock().unwrap_or_else(PoisonError::into_inner);
    match params.get("action").map(String::as_str) {
        Some("getProducts") => match data.products_status {
            Some(status) => (status, "sheet unavailable").into_response(),
            None => Json(data.products.clone()).into_response(),
        },
        Some("getUserAccess") => {
            let body = params
                .get("userId")
                .and_then(|id| data.access.get(id))
                .cloned()
                .unwrap_or_else(|| json!({"status": "success", "access": []}));
            Json(body).into_response()
        }
        Some("getStats") => Json(data.stats.clone()).into_response(),
        _ => (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    }
}

async fn record_event(State(data): State<Arc<Mutex<GatewayData>>>, Json(event): Json<Value>) -> &'static str {
    data.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .events
        .push(event);
    "ok"
}

/// A running storefront wired to a [`MockGateway`].
pub struct TestContext {
    pub state: AppState,
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Start a storefront without a catalog cache.
    pub async fn start(gateway: &MockGateway) -> Self {
        Self::start_with_cache(gateway, None).await
    }

    /// Start a storefront using `cache_path` for the catalog cache.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    #[allow(clippy::expect_used)]
    pub async fn start_with_cache(gateway: &MockGateway, cache_path: Option<PathBuf>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront");
        let addr = listener.local_addr().expect("Storefront has no address");
        let base_url = format!("http://{addr}");

        let state = AppState::new(StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            gateway: GatewayConfig {
                url: SecretString::from(gateway.url()),
                timeout: Some(Duration::from_secs(5)),
            },
            payment: PaymentConfig {
                base_url: Url::parse(PAYMENT_BASE).expect("Invalid payment URL"),
            },
            catalog_cache_path: cache_path,
            admin_user_ids: vec![ADMIN_ID],
            currency: "₽".to_string(),
            session_idle: Duration::from_secs(600),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        })
        .expect("Failed to build storefront state");

        let app = routes::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            state,
            client,
            base_url,
        }
    }

    /// Sync the catalog from the gateway, as the startup task does.
    ///
    /// # Panics
    ///
    /// Panics if the sync fails.
    #[allow(clippy::expect_used)]
    pub async fn sync_catalog(&self) -> usize {
        self.state
            .catalog()
            .sync(self.state.gateway())
            .await
            .expect("Catalog sync failed")
    }

    /// Absolute URL of a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET as a visitor outside Telegram.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// GET with Telegram init data in the header, as the Mini App sends it.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn get_as(&self, path: &str, init_data: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header(INIT_DATA_HEADER, init_data)
            .send()
            .await
            .expect("Request failed")
    }

    /// POST a form with Telegram init data.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn post_form_as(&self, path: &str, init_data: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header(INIT_DATA_HEADER, init_data)
            .form(form)
            .send()
            .await
            .expect("Request failed")
    }
}

/// A catalog sheet with one product per section plus a gated course.
#[must_use]
pub fn sample_rows() -> Value {
    json!([
        {
            "ID": "course-1",
            "Title": "Rust Course",
            "Description": "Learn Rust [[image:https://cdn.example.com/rust.png]] fast",
            "Price": "1 990",
            "Section": "Shop",
            "secretContent": "Lesson vault password: ferris",
            "useDetailModal": "TRUE"
        },
        {
            "id": "guide",
            "title": "Free Guide",
            "price": 0,
            "section": "shop",
            "externalLink": "https://example.com/guide"
        },
        {
            "id": "case",
            "title": "Client Case",
            "section": "Portfolio works"
        },
        "not a row",
        {
            "title": "Bonus Pack",
            "section": "BONUS"
        }
    ])
}
