//! Telegram user identity.
//!
//! The identity is whatever the Telegram client claims in its init data.
//! It is trusted as-is; absence of a claim means the app runs in guest mode.

use serde::{Deserialize, Serialize};

/// Identifier reported to the gateway for guests.
pub const GUEST_ID: &str = "guest";

/// The `user` object from Telegram WebApp init data.
///
/// Only the fields the storefront uses are kept; the rest of the object is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    /// Telegram user ID.
    pub id: i64,
    /// Public `@handle`, if the user has one.
    #[serde(default)]
    pub username: Option<String>,
    /// First name as shown in Telegram.
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Who is using the Mini App.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserIdentity {
    /// A Telegram user (init data carried a `user` claim).
    Telegram(TelegramUser),
    /// No claim available: opened outside Telegram or the claim was unreadable.
    #[default]
    Guest,
}

impl UserIdentity {
    /// Returns true for the anonymous identity.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// Returns the Telegram user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&TelegramUser> {
        match self {
            Self::Telegram(user) => Some(user),
            Self::Guest => None,
        }
    }

    /// Returns the numeric Telegram ID, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }

    /// Returns the `@handle` (without the `@`), if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user().and_then(|u| u.username.as_deref())
    }

    /// User ID as sent to the gateway (`"guest"` for guests).
    #[must_use]
    pub fn gateway_id(&self) -> String {
        self.user_id()
            .map_or_else(|| GUEST_ID.to_string(), |id| id.to_string())
    }

    /// Name for greetings: first name, then handle, then a neutral fallback.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Telegram(user) => user
                .first_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .or_else(|| user.username.as_ref().map(|u| format!("@{u}")))
                .unwrap_or_else(|| format!("#{}", user.id)),
            Self::Guest => "Guest".to_string(),
        }
    }
}
