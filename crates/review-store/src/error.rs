//! Error types for review storage.

use review_core::ReviewError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// A review with this id already exists.
    #[error("duplicate review: {id}")]
    Duplicate {
        /// The identifier that was already taken.
        id: String,
    },

    /// A partition failed to answer.
    #[error("partition {partition} unavailable: {message}")]
    PartitionUnavailable {
        /// Alias of the failing partition.
        partition: String,
        /// Underlying failure.
        message: String,
    },

    /// Topology or routing misconfiguration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Shorthand for a missing review.
    #[must_use]
    pub fn review_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "review",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing product.
    #[must_use]
    pub fn product_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "product",
            id: id.to_string(),
        }
    }

    /// Whether this error means the record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ReviewError> for StoreError {
    fn from(err: ReviewError) -> Self {
        Self::Configuration(err.to_string())
    }
}
