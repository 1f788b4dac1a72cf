//! Error types for the review domain.

use crate::ids::IdError;

/// Result type for review domain operations.
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Errors raised by domain validation and routing policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// Rating outside the accepted range.
    #[error("invalid rating {0}: must be between 1 and 5")]
    InvalidRating(i64),

    /// A shard map needs at least one partition.
    #[error("invalid shard count: {0}")]
    InvalidShardCount(usize),

    /// The partition index is not part of the shard map.
    #[error("partition {index} out of range for {count} partitions")]
    PartitionOutOfRange {
        /// The requested partition.
        index: u32,
        /// Configured partition count.
        count: u32,
    },

    /// Allocating another identifier would overflow.
    #[error("review id space exhausted at sequence {sequence}")]
    IdSpaceExhausted {
        /// The sequence number that could not be mapped to an id.
        sequence: u64,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
