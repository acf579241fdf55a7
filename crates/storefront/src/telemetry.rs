//! Fire-and-forget event pings.
//!
//! Delivery is at most once: [`TelemetryReporter::report`] spawns the POST
//! and returns immediately, the response is never read, failures are logged
//! at debug level and dropped, and nothing is retried or ordered. Callers
//! must not depend on an event having reached the gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use sheetshop_core::{Order, UserIdentity};

use crate::gateway::{GatewayClient, GatewayEvent};

/// Count of events handed to the runtime, by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatched {
    pub sessions: u64,
    pub orders: u64,
}

/// Sends `session` and `order` events to the gateway. Cheap to clone.
#[derive(Clone)]
pub struct TelemetryReporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    gateway: GatewayClient,
    sessions: AtomicU64,
    orders: AtomicU64,
}

impl TelemetryReporter {
    #[must_use]
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            inner: Arc::new(ReporterInner {
                gateway,
                sessions: AtomicU64::new(0),
                orders: AtomicU64::new(0),
            }),
        }
    }

    /// Record that `identity` entered `page`.
    pub fn session(&self, identity: &UserIdentity, page: &str) {
        self.report(GatewayEvent::session(identity, page));
    }

    /// Record a submitted order.
    pub fn order(&self, order: &Order) {
        self.report(GatewayEvent::order(order));
    }

    /// Dispatch `event` without waiting for it.
    pub fn report(&self, event: GatewayEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(kind = event.kind(), "No runtime; dropping event");
            return;
        };

        match event {
            GatewayEvent::Session(_) => self.inner.sessions.fetch_add(1, Ordering::Relaxed),
            GatewayEvent::Order(_) => self.inner.orders.fetch_add(1, Ordering::Relaxed),
        };

        let gateway = self.inner.gateway.clone();
        runtime.spawn(async move {
            if let Err(e) = gateway.post_event(&event).await {
                debug!(kind = event.kind(), error = %e, "Event ping failed");
            }
        });
    }

    /// Events dispatched so far.
    #[must_use]
    pub fn dispatched(&self) -> Dispatched {
        Dispatched {
            sessions: self.inner.sessions.load(Ordering::Relaxed),
            orders: self.inner.orders.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::GatewayConfig;

    fn reporter() -> TelemetryReporter {
        // Nothing listens on the discard port; pings fail quietly.
        let gateway = GatewayClient::new(&GatewayConfig {
            url: SecretString::from("http://127.0.0.1:9/exec"),
            timeout: None,
        })
        .unwrap();
        TelemetryReporter::new(gateway)
    }

    #[tokio::test]
    async fn test_report_returns_immediately_and_counts() {
        let reporter = reporter();
        reporter.session(&UserIdentity::Guest, "home");
        reporter.session(&UserIdentity::Guest, "catalog");
        assert_eq!(
            reporter.dispatched(),
            Dispatched {
                sessions: 2,
                orders: 0
            }
        );
    }

    #[test]
    fn test_report_without_runtime_drops_event() {
        let reporter = reporter();
        reporter.session(&UserIdentity::Guest, "home");
        assert_eq!(reporter.dispatched(), Dispatched::default());
    }
}
