//! Product choice handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiError;
use crate::handlers::reviews::ProductResponse;
use crate::state::AppState;

/// Products a review can be written for.
#[derive(Debug, Serialize)]
pub struct ProductChoicesResponse {
    /// Products ordered by name.
    pub products: Vec<ProductResponse>,
}

/// List the products on offer for new reviews (served from cache).
pub async fn list_product_choices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProductChoicesResponse>, ApiError> {
    let products = state
        .product_choices
        .get_or_load(Utc::now(), || state.catalog.list_products())?;

    Ok(Json(ProductChoicesResponse {
        products: products.iter().map(ProductResponse::from).collect(),
    }))
}
