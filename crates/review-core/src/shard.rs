//! Deterministic shard map.
//!
//! A review lives on partition `id % count`. The map is a pure function of the
//! identifier, so it gives the same answer on the write path, on the read path
//! and across restarts. Changing `count` orphans existing rows.

use std::num::NonZeroU32;

use crate::error::{Result, ReviewError};
use crate::ReviewId;

/// Alias prefix for partition stores (`reviews-0`, `reviews-1`, ...).
pub const PARTITION_ALIAS_PREFIX: &str = "reviews-";

/// Maps review identifiers to partition indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardMap {
    count: NonZeroU32,
}

impl ShardMap {
    /// Create a map over `count` partitions.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidShardCount` if `count` is zero or does not
    /// fit in a `u32`.
    pub fn new(count: usize) -> Result<Self> {
        u32::try_from(count)
            .ok()
            .and_then(NonZeroU32::new)
            .map(|count| Self { count })
            .ok_or(ReviewError::InvalidShardCount(count))
    }

    /// Number of partitions.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count.get()
    }

    /// Partition holding `id`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // remainder is below a u32 count
    pub const fn shard_of(&self, id: ReviewId) -> u32 {
        (id.get() % self.count.get() as u64) as u32
    }

    /// Compose the id for the `sequence`-th row written to `partition`.
    ///
    /// The result always satisfies `shard_of(id) == partition`.
    ///
    /// # Errors
    ///
    /// Returns `PartitionOutOfRange` for an unknown partition and
    /// `IdSpaceExhausted` on overflow.
    pub fn compose_id(&self, sequence: u64, partition: u32) -> Result<ReviewId> {
        if partition >= self.count() {
            return Err(ReviewError::PartitionOutOfRange {
                index: partition,
                count: self.count(),
            });
        }
        sequence
            .checked_mul(u64::from(self.count()))
            .and_then(|base| base.checked_add(u64::from(partition)))
            .map(ReviewId::new)
            .ok_or(ReviewError::IdSpaceExhausted { sequence })
    }

    /// All partition indices, in order.
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        0..self.count()
    }

    /// Alias for the partition at `index`.
    #[must_use]
    pub fn alias(index: u32) -> String {
        format!("{PARTITION_ALIAS_PREFIX}{index}")
    }
}
