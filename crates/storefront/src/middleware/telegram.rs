//! Telegram identity extractor.
//!
//! The Mini App forwards `Telegram.WebApp.initData` on every HTMX request in
//! the `X-Telegram-Init-Data` header; the first page load may carry it in the
//! `tgWebAppData` query parameter instead. The `user` claim is read as-is
//! (the init data hash is not verified). Once seen, the identity is kept in
//! the session so plain navigations stay signed in.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::Span;

use sheetshop_core::{TelegramUser, UserIdentity};

/// Header carrying raw init data.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Query parameter carrying raw init data on the first load.
pub const INIT_DATA_QUERY: &str = "tgWebAppData";

/// Session key holding the last seen identity.
pub const IDENTITY_KEY: &str = "telegram_identity";

/// Parse the `user` claim out of raw init data.
///
/// Returns `None` when the claim is missing or is not a user object.
#[must_use]
pub fn parse_init_data(init_data: &str) -> Option<TelegramUser> {
    let user_json = url::form_urlencoded::parse(init_data.as_bytes())
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value)?;

    serde_json::from_str(&user_json)
        .map_err(|e| tracing::debug!(error = %e, "Unreadable Telegram user claim"))
        .ok()
}

/// Init data from the header, falling back to the query string.
fn raw_init_data(parts: &Parts) -> Option<String> {
    if let Some(value) = parts
        .headers
        .get(INIT_DATA_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return Some(value.to_string());
    }

    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == INIT_DATA_QUERY)
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.trim().is_empty())
}

/// The current visitor. Never rejects: no usable claim means guest.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Identity(identity): Identity) -> impl IntoResponse {
///     format!("Hello, {}!", identity.display_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity(pub UserIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claimed = raw_init_data(parts)
            .as_deref()
            .and_then(parse_init_data)
            .map(UserIdentity::Telegram);

        let session = parts.extensions.get::<Session>().cloned();

        let identity = match (claimed, session) {
            (Some(identity), Some(session)) => {
                if let Err(e) = session.insert(IDENTITY_KEY, &identity).await {
                    tracing::warn!(error = %e, "Failed to store identity in session");
                }
                identity
            }
            (Some(identity), None) => identity,
            (None, Some(session)) => session
                .get::<UserIdentity>(IDENTITY_KEY)
                .await
                .ok()
                .flatten()
                .unwrap_or_default(),
            (None, None) => UserIdentity::Guest,
        };

        if let Some(user) = identity.user() {
            Span::current().record("user_id", user.id);
            crate::error::set_sentry_user(user.id, user.username.as_deref());
        }

        Ok(Self(identity))
    }
}
