//! Per-user state registry.
//!
//! Keeps one [`AccessState`] per Telegram user in a moka cache that forgets
//! users after an idle period. Guests get a fresh, unshared state each time.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use sheetshop_core::UserIdentity;

use crate::access::AccessState;

/// Upper bound on concurrently tracked users.
const MAX_USERS: u64 = 100_000;

/// Registry of per-user access state. Cheap to clone.
#[derive(Clone)]
pub struct SessionRegistry {
    users: Cache<i64, Arc<AccessState>>,
}

impl SessionRegistry {
    /// Create a registry that drops users idle for longer than `idle`.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            users: Cache::builder()
                .max_capacity(MAX_USERS)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Access state for `identity`, created on first use.
    pub async fn access_state(&self, identity: &UserIdentity) -> Arc<AccessState> {
        match identity.user_id() {
            Some(id) => {
                self.users
                    .get_with(id, async { Arc::new(AccessState::new()) })
                    .await
            }
            None => Arc::new(AccessState::new()),
        }
    }

    /// Number of tracked users (approximate until pending tasks run).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.users.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use sheetshop_core::TelegramUser;

    use super::*;

    fn telegram(id: i64) -> UserIdentity {
        UserIdentity::Telegram(TelegramUser {
            id,
            username: None,
            first_name: None,
        })
    }

    #[tokio::test]
    async fn test_same_user_shares_state() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let a = registry.access_state(&telegram(1)).await;
        let b = registry.access_state(&telegram(1)).await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let a = registry.access_state(&telegram(1)).await;
        let b = registry.access_state(&telegram(2)).await;
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_guests_get_ephemeral_state() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let a = registry.access_state(&UserIdentity::Guest).await;
        let b = registry.access_state(&UserIdentity::Guest).await;
        assert!(!Arc::ptr_eq(&a, &b));
        registry.users.run_pending_tasks().await;
        assert!(registry.is_empty());
    }
}
