//! Application state.

use std::sync::Arc;

use chrono::Duration;

use review_core::WriteBindWindow;
use review_store::{ProductCatalog, ReviewRouter, RocksStore, Store, StoreError};

use crate::cache::ProductChoicesCache;
use crate::config::{ServiceConfig, TopologyKind};
use crate::session::{MemorySessionStore, SessionStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Routes review reads and writes to the configured stores.
    pub router: Arc<ReviewRouter>,

    /// The external product catalog.
    pub catalog: Arc<dyn ProductCatalog>,

    /// Cached product choices for the review form.
    pub product_choices: Arc<ProductChoicesCache>,

    /// Session storage.
    pub sessions: Arc<dyn SessionStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state from already-opened stores.
    #[must_use]
    pub fn new(
        router: ReviewRouter,
        catalog: Arc<dyn ProductCatalog>,
        config: ServiceConfig,
    ) -> Self {
        let product_choices = Arc::new(ProductChoicesCache::new(seconds(
            config.product_cache_ttl_seconds,
        )));
        let sessions = Arc::new(MemorySessionStore::new(
            seconds(config.session_ttl_seconds),
            config.max_sessions,
        ));

        tracing::info!(
            topology = router.kind(),
            partitions = router.all_partitions().len(),
            "Review router ready"
        );

        Self {
            router: Arc::new(router),
            catalog,
            product_choices,
            sessions,
            config,
        }
    }

    /// Open every store named by `config` and build the state.
    ///
    /// # Errors
    ///
    /// Returns an error if any database cannot be opened or the topology is
    /// misconfigured.
    pub fn open(config: ServiceConfig) -> Result<Self, StoreError> {
        tracing::info!(path = %config.catalog_data_dir, "Opening product catalog");
        let catalog: Arc<dyn ProductCatalog> = Arc::new(RocksStore::open(&config.catalog_data_dir)?);

        let router = open_router(&config)?;
        Ok(Self::new(router, catalog, config))
    }
}

/// Saturating conversion; configuration loading already bounds these values.
fn seconds(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or(Duration::MAX)
}

/// Open the review stores for the configured topology.
fn open_router(config: &ServiceConfig) -> Result<ReviewRouter, StoreError> {
    match config.topology {
        TopologyKind::Single => {
            let path = config.master_path();
            tracing::info!(path = %path.display(), "Opening review store");
            Ok(ReviewRouter::single(Arc::new(RocksStore::open(path)?)))
        }
        TopologyKind::Replicated => {
            let path = config.master_path();
            tracing::info!(path = %path.display(), "Opening master review store");
            let master: Arc<dyn Store> = Arc::new(RocksStore::open(path)?);

            let default: Arc<dyn Store> = match &config.replica_data_dir {
                Some(replica) => {
                    tracing::info!(path = %replica, "Opening default review store");
                    Arc::new(RocksStore::open(replica)?)
                }
                None => {
                    tracing::warn!("No replica configured - default alias reads the master");
                    Arc::clone(&master)
                }
            };

            Ok(ReviewRouter::replicated(
                master,
                default,
                WriteBindWindow::from_secs(config.write_bind_seconds),
            ))
        }
        TopologyKind::Sharded => {
            let stores = config
                .partition_paths()
                .into_iter()
                .map(|path| {
                    tracing::info!(path = %path.display(), "Opening review partition");
                    RocksStore::open(path).map(|store| Arc::new(store) as Arc<dyn Store>)
                })
                .collect::<Result<Vec<_>, _>>()?;

            ReviewRouter::sharded(stores)
        }
    }
}
