//! Read and write routing across physical review stores.
//!
//! The router owns every store handle of a deployment and applies one of
//! three topologies:
//!
//! - **Single**: one store serves everything.
//! - **Replicated**: writes go to the master (`reviews`). Reads go to the
//!   master while the caller is inside its write-bind window, otherwise to
//!   the possibly stale `default` store.
//! - **Sharded**: a review lives on partition `id % N`. Writes pick a
//!   partition round-robin and mint an id that maps back to it. Listings scan
//!   every partition and fail as a whole if any partition fails.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use review_core::{
    sort_newest_first, NewReview, ProductId, ReadTarget, Review, ReviewId, ShardMap,
    WriteBindWindow,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// One partition of a sharded deployment.
#[derive(Clone)]
pub struct Partition {
    index: u32,
    alias: String,
    store: Arc<dyn Store>,
}

impl Partition {
    /// Position of the partition in the shard map.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Database alias (`reviews-{index}`).
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The partition's store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Tag a partition failure with this partition's alias.
    ///
    /// Missing records and duplicates pass through unchanged.
    fn unavailable(&self, err: StoreError) -> StoreError {
        match err {
            StoreError::Database(message) | StoreError::Serialization(message) => {
                tracing::error!(partition = %self.alias, error = %message, "Partition failed");
                StoreError::PartitionUnavailable {
                    partition: self.alias.clone(),
                    message,
                }
            }
            other => other,
        }
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("index", &self.index)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// The store layout a router applies.
pub enum Topology {
    /// One store.
    Single {
        /// The only store.
        store: Arc<dyn Store>,
    },
    /// Master plus a default store that may lag behind it.
    Replicated {
        /// Authoritative store, receives every write.
        master: Arc<dyn Store>,
        /// Store serving reads outside the write-bind window.
        default: Arc<dyn Store>,
        /// How long reads stay on the master after a write.
        window: WriteBindWindow,
    },
    /// Reviews spread over independent partitions.
    Sharded {
        /// Maps review ids to partitions.
        map: ShardMap,
        /// Partitions in index order.
        partitions: Vec<Partition>,
    },
}

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRoute {
    /// The only store of a single-store deployment.
    Single,
    /// Master or default store of a replicated deployment.
    Replica(ReadTarget),
    /// One partition of a sharded deployment.
    Partition(u32),
    /// Every partition of a sharded deployment.
    AllPartitions,
}

impl fmt::Display for ReadRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("default"),
            Self::Replica(target) => write!(f, "{target}"),
            Self::Partition(index) => f.write_str(&ShardMap::alias(*index)),
            Self::AllPartitions => f.write_str("all-partitions"),
        }
    }
}

/// A value together with the route that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed<T> {
    /// The value read.
    pub value: T,
    /// Where it was read from.
    pub route: ReadRoute,
}

/// Routes review reads and writes to physical stores.
pub struct ReviewRouter {
    topology: Topology,
    next_partition: AtomicU32,
}

impl ReviewRouter {
    /// Route everything to one store.
    #[must_use]
    pub fn single(store: Arc<dyn Store>) -> Self {
        Self::from_topology(Topology::Single { store })
    }

    /// Route writes to `master` and reads by write-bind window.
    #[must_use]
    pub fn replicated(
        master: Arc<dyn Store>,
        default: Arc<dyn Store>,
        window: WriteBindWindow,
    ) -> Self {
        Self::from_topology(Topology::Replicated {
            master,
            default,
            window,
        })
    }

    /// Spread reviews over `stores`, one partition per store, in order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if `stores` is empty.
    pub fn sharded(stores: Vec<Arc<dyn Store>>) -> Result<Self> {
        let map = ShardMap::new(stores.len())?;
        let partitions = map
            .indices()
            .zip(stores)
            .map(|(index, store)| Partition {
                index,
                alias: ShardMap::alias(index),
                store,
            })
            .collect();

        Ok(Self::from_topology(Topology::Sharded { map, partitions }))
    }

    fn from_topology(topology: Topology) -> Self {
        Self {
            topology,
            next_partition: AtomicU32::new(0),
        }
    }

    /// The topology in use.
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Short topology name for logs and health output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self.topology {
            Topology::Single { .. } => "single",
            Topology::Replicated { .. } => "replicated",
            Topology::Sharded { .. } => "sharded",
        }
    }

    /// The shard map, when sharded.
    #[must_use]
    pub const fn shard_map(&self) -> Option<ShardMap> {
        match &self.topology {
            Topology::Sharded { map, .. } => Some(*map),
            _ => None,
        }
    }

    /// Partition holding `id`, when sharded.
    #[must_use]
    pub fn shard_of(&self, id: ReviewId) -> Option<u32> {
        self.shard_map().map(|map| map.shard_of(id))
    }

    /// Every partition in index order; empty unless sharded.
    #[must_use]
    pub fn all_partitions(&self) -> &[Partition] {
        match &self.topology {
            Topology::Sharded { partitions, .. } => partitions,
            _ => &[],
        }
    }

    /// Route for reads that are not keyed by a review id.
    #[must_use]
    pub fn read_route(&self, last_write: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ReadRoute {
        match &self.topology {
            Topology::Single { .. } => ReadRoute::Single,
            Topology::Replicated { window, .. } => {
                ReadRoute::Replica(window.route_for_read(last_write, now))
            }
            Topology::Sharded { .. } => ReadRoute::AllPartitions,
        }
    }

    /// Write a new review and return it with its allocated id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if id allocation or the insert fails. In the
    /// sharded topology storage failures surface as `PartitionUnavailable`.
    pub fn create_review(&self, new: NewReview, now: DateTime<Utc>) -> Result<Review> {
        let review = match &self.topology {
            Topology::Single { store } | Topology::Replicated { master: store, .. } => {
                let id = ReviewId::new(store.next_review_sequence()?);
                let review = Review::from_new(id, new, now);
                store.insert_review(&review)?;
                review
            }
            Topology::Sharded { map, partitions } => {
                let index = self.next_partition.fetch_add(1, Ordering::Relaxed) % map.count();
                let partition = partitions.get(index as usize).ok_or_else(|| {
                    StoreError::Configuration(format!("partition {index} has no store"))
                })?;

                let sequence = partition
                    .store
                    .next_review_sequence()
                    .map_err(|e| partition.unavailable(e))?;
                let id = map.compose_id(sequence, partition.index)?;
                let review = Review::from_new(id, new, now);
                partition
                    .store
                    .insert_review(&review)
                    .map_err(|e| partition.unavailable(e))?;
                review
            }
        };

        tracing::debug!(
            review_id = %review.id,
            product_id = %review.product_id,
            topology = self.kind(),
            "Review written"
        );

        Ok(review)
    }

    /// Fetch one review.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the consulted store has no such
    /// review, or a storage error if the read fails.
    pub fn get_review(
        &self,
        id: ReviewId,
        last_write: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Routed<Review>> {
        let (found, route) = match &self.topology {
            Topology::Single { store } => (store.get_review(id)?, ReadRoute::Single),
            Topology::Replicated {
                master,
                default,
                window,
            } => {
                let target = window.route_for_read(last_write, now);
                let store = match target {
                    ReadTarget::Master => master,
                    ReadTarget::Default => default,
                };
                (store.get_review(id)?, ReadRoute::Replica(target))
            }
            Topology::Sharded { map, partitions } => {
                let index = map.shard_of(id);
                let partition = partitions.get(index as usize).ok_or_else(|| {
                    StoreError::Configuration(format!("partition {index} has no store"))
                })?;
                let found = partition
                    .store
                    .get_review(id)
                    .map_err(|e| partition.unavailable(e))?;
                (found, ReadRoute::Partition(index))
            }
        };

        tracing::debug!(review_id = %id, route = %route, found = found.is_some(), "Review lookup");

        found
            .map(|value| Routed { value, route })
            .ok_or_else(|| StoreError::review_not_found(id))
    }

    /// List every review, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any consulted store fails. A sharded listing
    /// fails as a whole with `PartitionUnavailable` rather than returning the
    /// surviving partitions' rows.
    pub fn list_reviews(
        &self,
        last_write: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Routed<Vec<Review>>> {
        self.scan(last_write, now, |store| store.list_reviews())
    }

    /// List one product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Same failure policy as [`ReviewRouter::list_reviews`].
    pub fn list_reviews_for_product(
        &self,
        product_id: ProductId,
        last_write: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Routed<Vec<Review>>> {
        self.scan(last_write, now, |store| store.list_reviews_for_product(product_id))
    }

    fn scan<F>(
        &self,
        last_write: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        read: F,
    ) -> Result<Routed<Vec<Review>>>
    where
        F: Fn(&dyn Store) -> Result<Vec<Review>>,
    {
        let route = self.read_route(last_write, now);
        let value = match (&self.topology, route) {
            (Topology::Single { store }, _) => read(store.as_ref())?,
            (Topology::Replicated { master, .. }, ReadRoute::Replica(ReadTarget::Master)) => {
                read(master.as_ref())?
            }
            (Topology::Replicated { default, .. }, _) => read(default.as_ref())?,
            (Topology::Sharded { partitions, .. }, _) => {
                let mut merged = Vec::new();
                for partition in partitions {
                    let rows = read(partition.store.as_ref()).map_err(|e| partition.unavailable(e))?;
                    merged.extend(rows);
                }
                merge_partition_rows(merged)
            }
        };

        Ok(Routed { value, route })
    }
}

/// Deduplicate rows gathered from several partitions and order them newest first.
fn merge_partition_rows(mut rows: Vec<Review>) -> Vec<Review> {
    sort_newest_first(&mut rows);
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|review| seen.insert(review.id));
    rows
}
