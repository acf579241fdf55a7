//! Session middleware configuration.
//!
//! Sessions hold the visitor's view state and last seen identity. They live
//! in memory only; a restart sends everyone back to the home page.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sheetshop_session";

/// Create the session layer with an in-memory store.
///
/// Cookies are `SameSite=None` over HTTPS because the Mini App runs inside
/// Telegram's webview, which is a third-party context on Telegram Web.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    let idle_secs = i64::try_from(config.session_idle.as_secs()).unwrap_or(i64::MAX);
    let same_site = if config.is_secure() {
        tower_sessions::cookie::SameSite::None
    } else {
        tower_sessions::cookie::SameSite::Lax
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(idle_secs),
        ))
        .with_secure(config.is_secure())
        .with_same_site(same_site)
        .with_http_only(true)
        .with_path("/")
}
