//! In-memory product catalog.
//!
//! The app starts with whatever the disposable cache file holds (or an empty
//! catalog). A background task syncs from the gateway and swaps the new
//! catalog in atomically. A failed sync leaves the installed catalog as is;
//! nothing retries automatically, the next sync comes from
//! `POST /catalog/refresh`.
//!
//! Syncs may overlap (startup sync and a manual refresh, or a double tap).
//! Each one takes a sequence number when it starts, and a result is only
//! installed if no later sync has been installed already. The cache write and
//! the swap happen under one lock, so the cache file always matches memory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use sheetshop_core::{Product, Section};

use crate::gateway::{GatewayClient, GatewayError};

/// Errors from syncing or reading the catalog cache.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog sync failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("catalog cache I/O error: {0}")]
    CacheIo(#[from] io::Error),
    #[error("catalog cache is corrupt: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

/// Where catalog rows come from.
pub trait CatalogSource: Send + Sync {
    /// Fetch and normalize the full catalog.
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, GatewayError>> + Send;
}

impl CatalogSource for GatewayClient {
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, GatewayError>> + Send {
        self.get_products()
    }
}

/// Shared catalog handle. Cheap to clone.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    products: RwLock<Arc<Vec<Product>>>,
    loaded: AtomicBool,
    cache_path: Option<PathBuf>,
    /// Last sequence number handed to a sync.
    issued: AtomicU64,
    /// Sequence of the installed sync (0 = none yet).
    applied: Mutex<u64>,
}

impl CatalogStore {
    /// Create an empty store, optionally backed by a cache file.
    #[must_use]
    pub fn new(cache_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                products: RwLock::new(Arc::new(Vec::new())),
                loaded: AtomicBool::new(false),
                cache_path,
                issued: AtomicU64::new(0),
                applied: Mutex::new(0),
            }),
        }
    }

    /// The currently installed catalog.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Product>> {
        Arc::clone(
            &self
                .inner
                .products
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// True once a catalog has been installed from the cache or a sync.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::Acquire)
    }

    /// Find a product by ID, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<Product> {
        self.snapshot().iter().find(|p| p.id.matches(id)).cloned()
    }

    /// Products in any of `sections`, in catalog order.
    #[must_use]
    pub fn by_sections(&self, sections: &[Section]) -> Vec<Product> {
        self.snapshot()
            .iter()
            .filter(|p| sections.contains(&p.section))
            .cloned()
            .collect()
    }

    /// Products in one section, in catalog order.
    #[must_use]
    pub fn by_section(&self, section: Section) -> Vec<Product> {
        self.by_sections(&[section])
    }

    /// Install a new catalog wholesale.
    pub fn replace(&self, products: Vec<Product>) {
        let products = Arc::new(products);
        *self
            .inner
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner) = products;
        self.inner.loaded.store(true, Ordering::Release);
    }

    /// Fetch the catalog from `source` and install it.
    ///
    /// On success the cache file is overwritten; a cache write failure is
    /// logged and does not fail the sync. On failure the installed catalog
    /// is left untouched. A result that arrives after a later sync has
    /// already been installed is discarded.
    ///
    /// Returns the number of products in the installed catalog.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the fetch fails.
    #[instrument(skip_all, fields(sequence))]
    pub async fn sync<S: CatalogSource>(&self, source: &S) -> Result<usize, CatalogError> {
        let sequence = self.inner.issued.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::Span::current().record("sequence", sequence);

        let products = match source.fetch_products().await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Catalog sync failed; keeping current catalog");
                return Err(e.into());
            }
        };

        let mut applied = self.inner.applied.lock().await;
        if sequence <= *applied {
            debug!(applied = *applied, "Discarded out-of-order catalog sync");
            return Ok(self.snapshot().len());
        }

        let count = products.len();
        if let Some(path) = &self.inner.cache_path {
            if let Err(e) = write_cache(path, &products).await {
                warn!(error = %e, path = %path.display(), "Failed to write catalog cache");
            }
        }

        self.replace(products);
        *applied = sequence;
        info!(products = count, "Catalog synced");
        Ok(count)
    }

    /// Install the catalog from the cache file, if there is one.
    ///
    /// Returns the number of products loaded, or `None` when no cache is
    /// configured, the file does not exist yet, or a sync has already
    /// installed a fresher catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a catalog.
    pub async fn load_cache(&self) -> Result<Option<usize>, CatalogError> {
        let Some(path) = &self.inner.cache_path else {
            return Ok(None);
        };

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No catalog cache yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let products: Vec<Product> = serde_json::from_slice(&bytes)?;
        let applied = self.inner.applied.lock().await;
        if *applied > 0 {
            debug!("Catalog already synced; ignoring cache");
            return Ok(None);
        }
        let count = products.len();
        self.replace(products);
        drop(applied);
        info!(products = count, path = %path.display(), "Catalog loaded from cache");
        Ok(Some(count))
    }
}

/// Overwrite the cache file via a sibling temp file.
async fn write_cache(path: &Path, products: &[Product]) -> Result<(), CatalogError> {
    let bytes = serde_json::to_vec(products)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Spawn the one-shot startup sync.
pub fn sync_in_background(catalog: CatalogStore, gateway: GatewayClient) {
    info!("Spawning background catalog sync");
    tokio::spawn(async move {
        if let Err(e) = catalog.sync(&gateway).await {
            error!(error = %e, "Startup catalog sync failed; serving cached catalog");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sheetshop_core::ProductId;
    use tokio::sync::Notify;

    use super::*;

    struct FixedSource(Vec<Product>);

    impl CatalogSource for FixedSource {
        async fn fetch_products(&self) -> Result<Vec<Product>, GatewayError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl CatalogSource for FailingSource {
        async fn fetch_products(&self) -> Result<Vec<Product>, GatewayError> {
            Err(GatewayError::Status(500))
        }
    }

    /// Holds its fetch until the gate is opened.
    struct GatedSource {
        products: Vec<Product>,
        gate: Arc<Notify>,
    }

    impl CatalogSource for GatedSource {
        async fn fetch_products(&self) -> Result<Vec<Product>, GatewayError> {
            self.gate.notified().await;
            Ok(self.products.clone())
        }
    }

    fn product(id: &str, section: Section) -> Product {
        let mut product = Product::new(ProductId::new(id), id);
        product.section = section;
        product
    }

    fn sample() -> Vec<Product> {
        vec![
            product("a", Section::Shop),
            product("b", Section::Portfolio),
            product("c", Section::Bonus),
            product("D", Section::Shop),
        ]
    }

    #[tokio::test]
    async fn test_sync_installs_catalog() {
        let store = CatalogStore::new(None);
        assert!(!store.is_loaded());

        let count = store.sync(&FixedSource(sample())).await.unwrap();
        assert_eq!(count, 4);
        assert!(store.is_loaded());
        assert_eq!(store.snapshot().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_sync_keeps_same_catalog() {
        let store = CatalogStore::new(None);
        store.sync(&FixedSource(sample())).await.unwrap();
        let before = store.snapshot();

        let result = store.sync(&FailingSource).await;
        assert!(matches!(result, Err(CatalogError::Gateway(GatewayError::Status(500)))));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[tokio::test]
    async fn test_failed_first_sync_stays_unloaded() {
        let store = CatalogStore::new(None);
        assert!(store.sync(&FailingSource).await.is_err());
        assert!(!store.is_loaded());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_late_older_sync_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let store = CatalogStore::new(Some(path.clone()));

        let gate = Arc::new(Notify::new());
        let slow = GatedSource {
            products: vec![product("old", Section::Shop)],
            gate: Arc::clone(&gate),
        };
        let fresh = FixedSource(sample());

        let (slow_result, fresh_result) = tokio::join!(store.sync(&slow), async {
            let result = store.sync(&fresh).await;
            gate.notify_one();
            result
        });

        assert_eq!(fresh_result.unwrap(), 4);
        assert_eq!(slow_result.unwrap(), 4);
        assert_eq!(store.snapshot().len(), 4);
        assert!(store.find("old").is_none());

        let restarted = CatalogStore::new(Some(path));
        assert_eq!(restarted.load_cache().await.unwrap(), Some(4));
        assert!(restarted.find("old").is_none());
    }

    #[tokio::test]
    async fn test_cache_does_not_replace_synced_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let store = CatalogStore::new(Some(path.clone()));
        store.sync(&FixedSource(sample())).await.unwrap();

        let stale = serde_json::to_vec(&vec![product("old", Section::Shop)]).unwrap();
        std::fs::write(&path, stale).unwrap();

        assert_eq!(store.load_cache().await.unwrap(), None);
        assert!(store.find("old").is_none());
        assert_eq!(store.snapshot().len(), 4);
    }

    #[test]
    fn test_find_ignores_case_and_whitespace() {
        let store = CatalogStore::new(None);
        store.replace(sample());
        assert_eq!(store.find(" d ").unwrap().id.as_str(), "D");
        assert!(store.find("zzz").is_none());
    }

    #[test]
    fn test_sections() {
        let store = CatalogStore::new(None);
        store.replace(sample());
        let shop: Vec<String> = store.by_section(Section::Shop).into_iter().map(|p| p.title).collect();
        assert_eq!(shop, vec!["a", "D"]);
        assert_eq!(store.by_sections(&[Section::Portfolio, Section::Bonus]).len(), 2);
    }

    #[tokio::test]
    async fn test_cache_round_trips_through_startup_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("catalog.json");

        let store = CatalogStore::new(Some(path.clone()));
        store.sync(&FixedSource(sample())).await.unwrap();
        assert!(path.exists());

        let restarted = CatalogStore::new(Some(path));
        assert_eq!(restarted.load_cache().await.unwrap(), Some(4));
        assert!(restarted.is_loaded());
        assert_eq!(*restarted.snapshot(), *store.snapshot());
    }

    #[tokio::test]
    async fn test_missing_cache_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(Some(dir.path().join("absent.json")));
        assert_eq!(store.load_cache().await.unwrap(), None);
        assert!(!store.is_loaded());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = CatalogStore::new(Some(path));
        assert!(matches!(store.load_cache().await, Err(CatalogError::CacheFormat(_))));
    }

    #[tokio::test]
    async fn test_cache_write_failure_does_not_fail_sync() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("catalog.json");
        std::fs::create_dir(&path).unwrap();

        let store = CatalogStore::new(Some(path));
        assert_eq!(store.sync(&FixedSource(sample())).await.unwrap(), 4);
        assert!(store.is_loaded());
    }
}
