//! Cache of the product choices offered when writing a review.
//!
//! The catalog lives in another database, so the list is cached. The cache is
//! owned by the application state, expires after a TTL and can be invalidated
//! explicitly.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

use review_core::Product;

struct Cached {
    products: Arc<Vec<Product>>,
    loaded_at: DateTime<Utc>,
}

/// TTL cache for the product choice list.
pub struct ProductChoicesCache {
    ttl: Duration,
    slot: RwLock<Option<Cached>>,
}

impl ProductChoicesCache {
    /// Create an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached list, loading it with `load` when missing or stale.
    ///
    /// A failed load leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` returns on failure.
    pub fn get_or_load<E, F>(&self, now: DateTime<Utc>, load: F) -> Result<Arc<Vec<Product>>, E>
    where
        F: FnOnce() -> Result<Vec<Product>, E>,
    {
        if let Some(products) = self.fresh(now) {
            return Ok(products);
        }

        let products = Arc::new(load()?);
        tracing::debug!(count = products.len(), "Product choices reloaded");

        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Cached {
            products: Arc::clone(&products),
            loaded_at: now,
        });
        Ok(products)
    }

    /// Drop the cached list so the next read reloads it.
    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<Vec<Product>>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|cached| now.signed_duration_since(cached.loaded_at) < self.ttl)
            .map(|cached| Arc::clone(&cached.products))
    }
}
