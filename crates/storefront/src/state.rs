//! Application state shared across handlers.

use std::sync::Arc;

use crate::access::AccessResolver;
use crate::catalog::CatalogStore;
use crate::config::StorefrontConfig;
use crate::gateway::{GatewayClient, GatewayError};
use crate::registry::SessionRegistry;
use crate::telemetry::TelemetryReporter;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    gateway: GatewayClient,
    catalog: CatalogStore,
    registry: SessionRegistry,
    resolver: AccessResolver,
    telemetry: TelemetryReporter,
}

impl AppState {
    /// Create a new application state with an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, GatewayError> {
        let gateway = GatewayClient::new(&config.gateway)?;
        let catalog = CatalogStore::new(config.catalog_cache_path.clone());
        let registry = SessionRegistry::new(config.session_idle);
        let resolver = AccessResolver::new(gateway.clone());
        let telemetry = TelemetryReporter::new(gateway.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                catalog,
                registry,
                resolver,
                telemetry,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn gateway(&self) -> &GatewayClient {
        &self.inner.gateway
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn resolver(&self) -> &AccessResolver {
        &self.inner.resolver
    }

    #[must_use]
    pub fn telemetry(&self) -> &TelemetryReporter {
        &self.inner.telemetry
    }
}
