//! Common test utilities for review service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use review_core::{Product, ProductId, Review, ReviewId, WriteBindWindow};
use review_service::{create_router, AppState, ServiceConfig, TopologyKind, SESSION_HEADER};
use review_store::{ProductCatalog, ReviewRouter, RocksStore, Store, StoreError};

/// Products loaded into every test catalog.
pub const PRODUCTS: [(u64, &str); 3] = [(1, "Toaster"), (2, "Blender"), (3, "Kettle")];

/// A partition whose database cannot be reached.
pub struct DownStore;

impl DownStore {
    fn refused() -> StoreError {
        StoreError::Database("connection refused".into())
    }
}

impl Store for DownStore {
    fn next_review_sequence(&self) -> review_store::Result<u64> {
        Err(Self::refused())
    }
    fn insert_review(&self, _review: &Review) -> review_store::Result<()> {
        Err(Self::refused())
    }
    fn get_review(&self, _id: ReviewId) -> review_store::Result<Option<Review>> {
        Err(Self::refused())
    }
    fn list_reviews(&self) -> review_store::Result<Vec<Review>> {
        Err(Self::refused())
    }
    fn list_reviews_for_product(&self, _product_id: ProductId) -> review_store::Result<Vec<Review>> {
        Err(Self::refused())
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the databases (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Healthy review stores by position: the single store, master then
    /// default, or the partitions in order.
    pub stores: Vec<Arc<RocksStore>>,
}

impl TestHarness {
    /// Single-store deployment.
    pub fn single() -> Self {
        Self::build(TopologyKind::Single, 1, 60)
    }

    /// Master plus a default store that never receives replicated writes.
    pub fn replicated(write_bind_seconds: i64) -> Self {
        Self::build(TopologyKind::Replicated, 2, write_bind_seconds)
    }

    /// Sharded deployment over `partitions` stores.
    pub fn sharded(partitions: usize) -> Self {
        Self::build(TopologyKind::Sharded, partitions, 60)
    }

    /// Sharded deployment whose last partition is unreachable.
    ///
    /// Partitions `0..healthy` are real stores; partition `healthy` is down.
    pub fn sharded_with_down_partition(healthy: usize) -> Self {
        let down: Arc<dyn Store> = Arc::new(DownStore);
        Self::build_with(TopologyKind::Sharded, healthy, 60, Some(down))
    }

    fn build(topology: TopologyKind, store_count: usize, write_bind_seconds: i64) -> Self {
        Self::build_with(topology, store_count, write_bind_seconds, None)
    }

    fn build_with(
        topology: TopologyKind,
        store_count: usize,
        write_bind_seconds: i64,
        extra: Option<Arc<dyn Store>>,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let catalog = RocksStore::open(temp_dir.path().join("catalog")).expect("Failed to open catalog");
        for (id, name) in PRODUCTS {
            catalog
                .put_product(&Product::new(ProductId::new(id), name))
                .expect("Failed to seed catalog");
        }

        let stores: Vec<Arc<RocksStore>> = (0..store_count)
            .map(|i| {
                Arc::new(
                    RocksStore::open(temp_dir.path().join(format!("reviews-{i}")))
                        .expect("Failed to open store"),
                )
            })
            .collect();
        let mut handles: Vec<Arc<dyn Store>> = stores
            .iter()
            .map(|store| Arc::clone(store) as Arc<dyn Store>)
            .collect();
        handles.extend(extra);
        let partition_count = handles.len();

        let router = match topology {
            TopologyKind::Single => ReviewRouter::single(Arc::clone(&handles[0])),
            TopologyKind::Replicated => ReviewRouter::replicated(
                Arc::clone(&handles[0]),
                Arc::clone(&handles[1]),
                WriteBindWindow::from_secs(write_bind_seconds),
            ),
            TopologyKind::Sharded => ReviewRouter::sharded(handles).expect("Failed to shard"),
        };

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            topology,
            write_bind_seconds,
            shard_count: u32::try_from(partition_count).expect("shard count"),
            ..ServiceConfig::default()
        };

        let catalog: Arc<dyn ProductCatalog> = Arc::new(catalog);
        let state = AppState::new(router, catalog, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            stores,
        }
    }

    /// Submit a review and return the response body and session id.
    pub async fn create_review(&self, session: Option<&str>, body: Value) -> (Value, String) {
        let mut request = self.server.post("/v1/reviews").json(&body);
        if let Some(session) = session {
            request = request.add_header(SESSION_HEADER, session.to_string());
        }
        let response = request.await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let session_id = response.header(SESSION_HEADER).to_str().expect("header").to_string();
        (response.json(), session_id)
    }

    /// Submit a simple review for `product_id`.
    pub async fn quick_review(&self, session: Option<&str>, product_id: u64, text: &str) -> (Value, String) {
        self.create_review(
            session,
            json!({ "product_id": product_id, "author_id": 7, "rating": 4, "text": text }),
        )
        .await
    }
}
