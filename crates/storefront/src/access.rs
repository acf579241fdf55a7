//! Per-user access resolution.
//!
//! Each Telegram user has one [`AccessState`] holding the last applied grant.
//! Refreshes may overlap (a user tapping between views faster than the
//! gateway answers), so every refresh takes a ticket from a per-user counter
//! and its result is applied only if no later ticket has been applied yet.
//! Results arriving out of order are discarded instead of overwriting
//! fresher state.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, instrument, warn};

use sheetshop_core::{AccessGrant, Product, TelegramUser, UserIdentity};

use crate::gateway::{GatewayClient, GatewayError};

/// Where access lists come from.
pub trait AccessSource: Send + Sync {
    /// Fetch the access grant of one user.
    fn fetch_access(
        &self,
        user: &TelegramUser,
    ) -> impl Future<Output = Result<AccessGrant, GatewayError>> + Send;
}

impl AccessSource for GatewayClient {
    fn fetch_access(
        &self,
        user: &TelegramUser,
    ) -> impl Future<Output = Result<AccessGrant, GatewayError>> + Send {
        self.get_user_access(user)
    }
}

/// Outcome of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Refresh {
    /// Guest identity: nothing fetched, nothing owned.
    Guest,
    /// The fetched grant is now current.
    Applied,
    /// A later refresh was applied first; this result was discarded.
    Stale,
    /// The fetch failed; the previous grant is kept.
    Failed,
}

#[derive(Debug, Default)]
struct AppliedGrant {
    sequence: u64,
    grant: AccessGrant,
}

/// Access state of one user.
#[derive(Debug, Default)]
pub struct AccessState {
    issued: AtomicU64,
    applied: Mutex<AppliedGrant>,
    in_flight: AtomicUsize,
}

impl AccessState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last applied grant.
    #[must_use]
    pub fn grant(&self) -> AccessGrant {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .grant
            .clone()
    }

    /// Ticket of the last applied refresh (0 = never applied).
    #[must_use]
    pub fn applied_sequence(&self) -> u64 {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sequence
    }

    /// True while at least one refresh is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Products from `catalog` the current grant covers.
    #[must_use]
    pub fn owned<'a>(&self, catalog: &'a [Product]) -> Vec<&'a Product> {
        self.grant().owned(catalog)
    }

    /// Take the next ticket and mark a refresh in flight.
    fn begin(&self) -> (u64, BusyGuard<'_>) {
        let sequence = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        (
            sequence,
            BusyGuard {
                in_flight: &self.in_flight,
            },
        )
    }

    /// Install `grant` unless a later ticket is already applied.
    fn apply(&self, sequence: u64, grant: AccessGrant) -> bool {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if sequence <= applied.sequence {
            return false;
        }
        *applied = AppliedGrant { sequence, grant };
        true
    }
}

/// Marks one refresh in flight until dropped, whichever way the refresh ends.
struct BusyGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Resolves access grants through an [`AccessSource`].
#[derive(Clone)]
pub struct AccessResolver<S = GatewayClient> {
    source: S,
}

impl<S: AccessSource> AccessResolver<S> {
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch the access list of `identity` and apply it to `state`.
    ///
    /// Guests short-circuit without a network call. A malformed response
    /// applies an empty grant; a failed request keeps the previous one.
    #[instrument(skip_all, fields(user_id = identity.user_id()))]
    pub async fn refresh(&self, identity: &UserIdentity, state: &AccessState) -> Refresh {
        let Some(user) = identity.user() else {
            return Refresh::Guest;
        };

        let (sequence, _busy) = state.begin();
        match self.source.fetch_access(user).await {
            Ok(grant) => {
                if state.apply(sequence, grant) {
                    debug!(sequence, "Applied access grant");
                    Refresh::Applied
                } else {
                    debug!(sequence, "Discarded out-of-order access grant");
                    Refresh::Stale
                }
            }
            Err(e) => {
                warn!(error = %e, sequence, "Access refresh failed; keeping previous grant");
                Refresh::Failed
            }
        }
    }
}
