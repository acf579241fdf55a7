//! Spreadsheet gateway client.
//!
//! # Architecture
//!
//! - A single webhook endpoint backed by a spreadsheet is the data store
//! - Reads are `GET ?action=<name>` returning JSON
//! - Writes are JSON `POST` pings whose response is never read
//! - The gateway is the source of truth; the storefront keeps only the
//!   normalized catalog and per-user access state in memory
//!
//! # Actions
//!
//! - `getProducts` - raw catalog rows (see [`conversions::products`])
//! - `getUserAccess` - `{status: "success", access: [...]}` for one user
//! - `getStats` - `{sessions: [...], leads: [...]}` for the admin dashboard
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetshop_storefront::gateway::GatewayClient;
//!
//! let client = GatewayClient::new(&config.gateway)?;
//! let products = client.get_products().await?;
//! ```

pub mod conversions;
pub mod types;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use sheetshop_core::{AccessGrant, Product, TelegramUser};

use crate::config::GatewayConfig;

pub use types::{GatewayEvent, GatewayStats};

/// Errors that can occur when talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed. The request URL is stripped on conversion.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Gateway answered with a non-success status.
    #[error("Gateway returned HTTP {0}")]
    Status(u16),

    /// Response was JSON but not the shape the action promises.
    #[error("Unexpected {action} response: {reason}")]
    UnexpectedShape {
        /// Gateway action that was called.
        action: &'static str,
        /// What was wrong with the body.
        reason: String,
    },

    /// Gateway URL could not be parsed.
    #[error("Invalid gateway URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        // The endpoint URL is a write credential; keep it out of messages.
        Self::Http(err.without_url())
    }
}

/// Gateway read actions.
pub mod actions {
    pub const GET_PRODUCTS: &str = "getProducts";
    pub const GET_USER_ACCESS: &str = "getUserAccess";
    pub const GET_STATS: &str = "getStats";
}

// =============================================================================
// GatewayClient
// =============================================================================

/// Client for the spreadsheet webhook.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    endpoint: Url,
}

impl GatewayClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint does not parse or the HTTP client
    /// fails to build.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let endpoint = config.endpoint()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(GatewayClientInner {
                client: builder.build()?,
                endpoint,
            }),
        })
    }

    /// URL for a read action with extra query parameters.
    fn action_url(&self, action: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.inner.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", action);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }

    /// Execute a read action and return the JSON body.
    async fn get_action(
        &self,
        action: &'static str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.action_url(action, params))
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                action,
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Gateway returned non-success status"
            );
            return Err(GatewayError::Status(status.as_u16()));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::warn!(
                action,
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse gateway response"
            );
            GatewayError::Parse(e)
        })
    }

    // =========================================================================
    // Read actions
    // =========================================================================

    /// Fetch and normalize the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a JSON array.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, GatewayError> {
        let body = self.get_action(actions::GET_PRODUCTS, &[]).await?;

        let serde_json::Value::Array(rows) = body else {
            return Err(GatewayError::UnexpectedShape {
                action: actions::GET_PRODUCTS,
                reason: "expected an array of rows".to_string(),
            });
        };

        let products = conversions::convert_rows(&rows);
        debug!(rows = rows.len(), products = products.len(), "Normalized catalog rows");
        Ok(products)
    }

    /// Fetch the access list of one Telegram user.
    ///
    /// Any body other than `{status: "success", access: [...]}` yields an
    /// empty grant rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn get_user_access(&self, user: &TelegramUser) -> Result<AccessGrant, GatewayError> {
        let user_id = user.id.to_string();
        let username = user.username.clone().unwrap_or_default();
        let body = self
            .get_action(
                actions::GET_USER_ACCESS,
                &[("userId", &user_id), ("username", &username)],
            )
            .await?;

        let grant = conversions::convert_access(&body);
        debug!(tokens = grant.len(), wildcard = grant.is_wildcard(), "Resolved access list");
        Ok(grant)
    }

    /// Fetch raw analytics for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a JSON object.
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<GatewayStats, GatewayError> {
        let body = self.get_action(actions::GET_STATS, &[]).await?;
        if !body.is_object() {
            return Err(GatewayError::UnexpectedShape {
                action: actions::GET_STATS,
                reason: "expected an object".to_string(),
            });
        }
        Ok(serde_json::from_value(body)?)
    }

    // =========================================================================
    // Write pings
    // =========================================================================

    /// POST an event to the gateway.
    ///
    /// Only transport errors surface; the response status and body are
    /// dropped unread.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent.
    pub async fn post_event(&self, event: &GatewayEvent) -> Result<(), GatewayError> {
        self.inner
            .client
            .post(self.inner.endpoint.clone())
            .json(event)
            .send()
            .await?;
        Ok(())
    }
}
