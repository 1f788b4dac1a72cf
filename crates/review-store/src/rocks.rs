//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` and
//! `ProductCatalog` traits.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use review_core::{Product, ProductId, Review, ReviewId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf, REVIEW_SEQUENCE_KEY};
use crate::{ProductCatalog, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-modify-write sequences (id allocation, duplicate checks).
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Insert or replace a catalog product.
    ///
    /// The catalog is owned elsewhere; this is how it gets loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn put_product(&self, product: &Product) -> Result<()> {
        let cf = self.cf(cf::PRODUCTS)?;
        let value = Self::serialize(product)?;

        self.db
            .put_cf(&cf, keys::product_key(product.id), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Resolve index keys to review records, skipping dangling entries.
    fn resolve_index<I>(&self, index_keys: I) -> Result<Vec<Review>>
    where
        I: IntoIterator<Item = Box<[u8]>>,
    {
        let mut reviews = Vec::new();
        for key in index_keys {
            let Some(id) = keys::review_id_from_index_key(&key) else {
                tracing::warn!(key_len = key.len(), "Skipping malformed index key");
                continue;
            };
            match self.get_review(id)? {
                Some(review) => reviews.push(review),
                None => tracing::warn!(review_id = %id, "Index entry without review record"),
            }
        }
        Ok(reviews)
    }
}

impl Store for RocksStore {
    fn next_review_sequence(&self) -> Result<u64> {
        let cf = self.cf(cf::META)?;
        let _guard = self.lock_writes();

        let current = match self
            .db
            .get_cf(&cf, REVIEW_SEQUENCE_KEY)
            .map_err(|e| StoreError::Database(e.to_string()))?
        {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Serialization("corrupt review sequence".to_string())
                })?;
                u64::from_be_bytes(bytes)
            }
            None => 0,
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::Database("review sequence exhausted".to_string()))?;

        self.db
            .put_cf(&cf, REVIEW_SEQUENCE_KEY, next.to_be_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(next)
    }

    fn insert_review(&self, review: &Review) -> Result<()> {
        let cf_reviews = self.cf(cf::REVIEWS)?;
        let cf_by_created = self.cf(cf::REVIEWS_BY_CREATED)?;
        let cf_by_product = self.cf(cf::REVIEWS_BY_PRODUCT)?;

        let review_key = keys::review_key(review.id);
        let created_key = keys::created_index_key(&review.created_at, review.id);
        let product_key = keys::product_index_key(review.product_id, &review.created_at, review.id);
        let value = Self::serialize(review)?;

        let _guard = self.lock_writes();

        let exists = self
            .db
            .get_cf(&cf_reviews, &review_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::Duplicate {
                id: review.id.to_string(),
            });
        }

        // Write atomically
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_reviews, &review_key, &value);
        batch.put_cf(&cf_by_created, &created_key, []);
        batch.put_cf(&cf_by_product, &product_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        let cf = self.cf(cf::REVIEWS)?;

        self.db
            .get_cf(&cf, keys::review_key(id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_reviews(&self) -> Result<Vec<Review>> {
        let cf_by_created = self.cf(cf::REVIEWS_BY_CREATED)?;

        // Reverse iteration yields newest first
        let mut index_keys = Vec::new();
        for item in self.db.iterator_cf(&cf_by_created, IteratorMode::End) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            index_keys.push(key);
        }

        self.resolve_index(index_keys)
    }

    fn list_reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let cf_by_product = self.cf(cf::REVIEWS_BY_PRODUCT)?;
        let prefix = keys::product_index_prefix(product_id);
        let upper = keys::product_index_upper_bound(product_id);

        let mut index_keys = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf_by_product, IteratorMode::From(&upper, Direction::Reverse))
        {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            index_keys.push(key);
        }

        self.resolve_index(index_keys)
    }
}

impl ProductCatalog for RocksStore {
    fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let cf = self.cf(cf::PRODUCTS)?;

        self.db
            .get_cf(&cf, keys::product_key(id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        let cf = self.cf(cf::PRODUCTS)?;

        let mut products: Vec<Product> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            products.push(Self::deserialize(&value)?);
        }

        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use review_core::{Author, Rating, UserId};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn review(id: u64, product: u64, secs: i64) -> Review {
        Review {
            id: ReviewId::new(id),
            product_id: ProductId::new(product),
            author: Author::User(UserId::new(5)),
            rating: Some(Rating::new(4).unwrap()),
            text: format!("review {id}"),
            created_at: at(secs),
        }
    }

    #[test]
    fn sequence_starts_at_one_and_persists() {
        let dir = TempDir::new().unwrap();
        {
            let store = RocksStore::open(dir.path()).unwrap();
            assert_eq!(store.next_review_sequence().unwrap(), 1);
            assert_eq!(store.next_review_sequence().unwrap(), 2);
        }

        // Reopen: the sequence continues instead of reissuing ids
        let store = RocksStore::open(dir.path()).unwrap();
        assert_eq!(store.next_review_sequence().unwrap(), 3);
    }

    #[test]
    fn review_insert_and_get() {
        let (store, _dir) = create_test_store();
        let original = review(1, 10, 1000);

        store.insert_review(&original).unwrap();

        let retrieved = store.get_review(ReviewId::new(1)).unwrap().unwrap();
        assert_eq!(retrieved, original);
        assert!(store.get_review(ReviewId::new(2)).unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_rejected() {
        let (store, _dir) = create_test_store();
        store.insert_review(&review(1, 10, 1000)).unwrap();

        let result = store.insert_review(&review(1, 11, 2000));
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));

        // Original row untouched
        let kept = store.get_review(ReviewId::new(1)).unwrap().unwrap();
        assert_eq!(kept.product_id, ProductId::new(10));
    }

    #[test]
    fn list_reviews_newest_first() {
        let (store, _dir) = create_test_store();
        store.insert_review(&review(1, 10, 1000)).unwrap();
        store.insert_review(&review(2, 11, 3000)).unwrap();
        store.insert_review(&review(3, 10, 2000)).unwrap();

        let ids: Vec<u64> = store
            .list_reviews()
            .unwrap()
            .iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn list_reviews_for_product_filters_and_orders() {
        let (store, _dir) = create_test_store();
        store.insert_review(&review(1, 10, 1000)).unwrap();
        store.insert_review(&review(2, 11, 3000)).unwrap();
        store.insert_review(&review(3, 10, 2000)).unwrap();
        store.insert_review(&review(4, 9, 4000)).unwrap();

        let ids: Vec<u64> = store
            .list_reviews_for_product(ProductId::new(10))
            .unwrap()
            .iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, vec![3, 1]);

        assert!(store
            .list_reviews_for_product(ProductId::new(99))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn catalog_products_ordered_by_name() {
        let (store, _dir) = create_test_store();
        store.put_product(&Product::new(ProductId::new(1), "Zither")).unwrap();
        store.put_product(&Product::new(ProductId::new(2), "Accordion")).unwrap();
        store.put_product(&Product::new(ProductId::new(3), "Banjo")).unwrap();

        let names: Vec<String> = store
            .list_products()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Accordion", "Banjo", "Zither"]);

        let banjo = store.get_product(ProductId::new(3)).unwrap().unwrap();
        assert_eq!(banjo.name, "Banjo");
        assert!(store.get_product(ProductId::new(4)).unwrap().is_none());
    }
}
