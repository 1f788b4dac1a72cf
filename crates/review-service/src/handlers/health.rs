//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Storage topology in use.
    pub topology: String,
    /// Number of partitions (zero unless sharded).
    pub partitions: usize,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "review-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        topology: state.router.kind().to_string(),
        partitions: state.router.all_partitions().len(),
    })
}
