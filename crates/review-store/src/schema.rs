//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary review records, keyed by `review_id`.
    pub const REVIEWS: &str = "reviews";

    /// Index: reviews by creation time, keyed by `created_at || review_id`.
    /// Value is empty (index only).
    pub const REVIEWS_BY_CREATED: &str = "reviews_by_created";

    /// Index: reviews by product, keyed by `product_id || created_at || review_id`.
    /// Value is empty (index only).
    pub const REVIEWS_BY_PRODUCT: &str = "reviews_by_product";

    /// Catalog products, keyed by `product_id`.
    pub const PRODUCTS: &str = "products";

    /// Store metadata such as the review id sequence.
    pub const META: &str = "meta";
}

/// Key in [`cf::META`] holding the last allocated review sequence number.
pub const REVIEW_SEQUENCE_KEY: &[u8] = b"review_sequence";

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::REVIEWS,
        cf::REVIEWS_BY_CREATED,
        cf::REVIEWS_BY_PRODUCT,
        cf::PRODUCTS,
        cf::META,
    ]
}
