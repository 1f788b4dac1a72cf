//! Product review HTTP API service.
//!
//! This crate provides the HTTP API for submitting and browsing product
//! reviews, including:
//!
//! - Review submission with read-your-own-write session stamping
//! - Review lookup routed to the master, default or owning partition
//! - Listings merged across partitions
//! - Cached product choices from the external catalog
//!
//! # Sessions
//!
//! Sessions are carried in the `x-session-id` header. Requests without one
//! are issued a fresh id, returned in the same header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers call blocking storage without awaiting

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

pub use cache::ProductChoicesCache;
pub use config::{ConfigError, ServiceConfig, TopologyKind};
pub use error::ApiError;
pub use routes::create_router;
pub use session::{MemorySessionStore, SessionHandle, SessionStore, SESSION_HEADER};
pub use state::AppState;
