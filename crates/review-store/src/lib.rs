//! `RocksDB` storage layer and read routing for the review service.
//!
//! This crate provides persistent storage for reviews and catalog products
//! using `RocksDB` with column families for efficient indexing, plus the
//! [`ReviewRouter`] that decides which physical store serves each request.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `reviews`: Primary review records, keyed by `review_id`
//! - `reviews_by_created`: Index for listing reviews newest first
//! - `reviews_by_product`: Index for listing a product's reviews newest first
//! - `products`: Catalog products, keyed by `product_id`
//! - `meta`: The persistent review id sequence
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use review_core::{Author, NewReview, ProductId};
//! use review_store::{ReviewRouter, RocksStore};
//!
//! let store = Arc::new(RocksStore::open("/tmp/reviews-db").unwrap());
//! let router = ReviewRouter::single(store);
//!
//! let review = router
//!     .create_review(
//!         NewReview {
//!             product_id: ProductId::new(1),
//!             author: Author::Anonymous,
//!             rating: None,
//!             text: "Does what it says".into(),
//!         },
//!         Utc::now(),
//!     )
//!     .unwrap();
//!
//! let fetched = router.get_review(review.id, None, Utc::now()).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod router;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use router::{Partition, ReadRoute, ReviewRouter, Routed, Topology};

use review_core::{Product, ProductId, Review, ReviewId};

/// The storage trait for one physical review store.
///
/// A deployment holds one store (single), two (master and default) or one per
/// partition. This trait abstracts the storage layer so the router can treat
/// them uniformly, and tests can substitute failing stores.
pub trait Store: Send + Sync {
    /// Allocate the next review sequence number.
    ///
    /// Sequences start at 1 and never repeat within one store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn next_review_sequence(&self) -> Result<u64>;

    /// Insert a new review and its index entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the id is already taken.
    fn insert_review(&self, review: &Review) -> Result<()>;

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_review(&self, id: ReviewId) -> Result<Option<Review>>;

    /// List all reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_reviews(&self) -> Result<Vec<Review>>;

    /// List the reviews of one product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>>;
}

/// Read-only access to the external product catalog.
pub trait ProductCatalog: Send + Sync {
    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// List all products ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_products(&self) -> Result<Vec<Product>>;
}
