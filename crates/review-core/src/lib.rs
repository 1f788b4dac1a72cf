//! Core types and routing policy for the review service.
//!
//! This crate has no storage dependencies. It provides:
//!
//! - **Identifiers**: `ReviewId`, `ProductId`, `UserId`, `SessionId`
//! - **Records**: `Review`, `NewReview`, `Product`, `Author`, `Rating`
//! - **Consistency**: `Session`, `stamp_write`, `WriteBindWindow`, `ReadTarget`
//! - **Sharding**: `ShardMap`
//!
//! # Read routing
//!
//! Reviews are written to an authoritative store. Two policies decide where
//! reads go:
//!
//! - With a replica, a user who wrote within the last `window` reads from the
//!   master; everybody else reads from the default store.
//! - With partitions, a review is read from partition `id % count`; listings
//!   scan every partition.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod consistency;
pub mod error;
pub mod ids;
pub mod review;
pub mod shard;

pub use consistency::{
    route_for_read, stamp_write, ReadTarget, Session, WriteBindWindow, LAST_WRITE_KEY,
};
pub use error::{Result, ReviewError};
pub use ids::{IdError, ProductId, ReviewId, SessionId, UserId};
pub use review::{
    sort_newest_first, Author, NewReview, Product, Rating, Review, MAX_RATING, MIN_RATING,
};
pub use shard::{ShardMap, PARTITION_ALIAS_PREFIX};
