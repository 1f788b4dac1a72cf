//! Review submission and browsing handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use review_core::{Author, NewReview, Product, ProductId, Rating, Review, ReviewId, ShardMap, UserId};

use crate::error::ApiError;
use crate::session::{record_write, SessionHandle, SESSION_HEADER};
use crate::state::AppState;

/// Review submission request.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// Product being reviewed.
    pub product_id: u64,
    /// Reviewer; omitted for anonymous reviews.
    #[serde(default)]
    pub author_id: Option<u64>,
    /// Optional rating between 1 and 5.
    ///
    /// Accepted as any integer so out-of-range values get a validation
    /// error rather than a decode failure.
    #[serde(default)]
    pub rating: Option<i64>,
    /// Review body.
    pub text: String,
}

/// A review as returned by the API.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    /// Review ID.
    pub id: u64,
    /// Reviewed product.
    pub product_id: u64,
    /// Reviewer.
    pub author: Author,
    /// Reviewer display name.
    pub reviewer: String,
    /// Rating, if given.
    pub rating: Option<u8>,
    /// Review body.
    pub text: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.get(),
            product_id: review.product_id.get(),
            author: review.author,
            reviewer: review.author.to_string(),
            rating: review.rating.map(Rating::get),
            text: review.text.clone(),
            created_at: review.created_at.to_rfc3339(),
        }
    }
}

/// A catalog product as returned by the API.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    /// Product ID.
    pub id: u64,
    /// Product name.
    pub name: String,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.get(),
            name: product.name.clone(),
        }
    }
}

/// Review creation response.
#[derive(Debug, Serialize)]
pub struct CreateReviewResponse {
    /// The stored review.
    pub review: ReviewResponse,
    /// Partition holding the review, when sharded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

/// Submit a review.
///
/// The caller's reads are bound to the master store for the configured
/// window afterwards.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    session: SessionHandle,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;

    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Review text is required".into()));
    }
    let rating = body.rating.map(Rating::try_from).transpose()?;
    let product_id = ProductId::new(body.product_id);

    let now = Utc::now();

    // Only products on offer can be reviewed
    let choices = state
        .product_choices
        .get_or_load(now, || state.catalog.list_products())?;
    if !choices.iter().any(|product| product.id == product_id) {
        return Err(ApiError::BadRequest(format!("Unknown product: {product_id}")));
    }

    let new = NewReview {
        product_id,
        author: Author::from_user(body.author_id.map(UserId::new)),
        rating,
        text: text.to_string(),
    };

    let review = state.router.create_review(new, now)?;
    record_write(state.sessions.as_ref(), session.id, now);

    tracing::info!(
        review_id = %review.id,
        product_id = %review.product_id,
        author = %review.author,
        session_id = %session.id,
        "Review created"
    );

    let response = CreateReviewResponse {
        review: ReviewResponse::from(&review),
        partition: state.router.shard_of(review.id).map(ShardMap::alias),
    };

    Ok((
        StatusCode::CREATED,
        [(SESSION_HEADER, session.id.to_string())],
        Json(response),
    ))
}

/// Single review response.
#[derive(Debug, Serialize)]
pub struct GetReviewResponse {
    /// The review.
    pub review: ReviewResponse,
    /// The reviewed product, if the catalog still has it.
    pub product: Option<ProductResponse>,
    /// Store alias that served the read.
    pub read_from: String,
}

/// Show one review.
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    session: SessionHandle,
    Path(review_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ReviewId = review_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid review ID".into()))?;

    let now = Utc::now();
    let last_write = state.sessions.load(session.id, now).last_write_time();

    let routed = state.router.get_review(id, last_write, now)?;
    let product = state.catalog.get_product(routed.value.product_id)?;

    let response = GetReviewResponse {
        review: ReviewResponse::from(&routed.value),
        product: product.as_ref().map(ProductResponse::from),
        read_from: routed.route.to_string(),
    };

    Ok(([(SESSION_HEADER, session.id.to_string())], Json(response)))
}

/// A product with its reviews.
#[derive(Debug, Serialize)]
pub struct ProductReviews {
    /// Product ID.
    pub id: u64,
    /// Product name.
    pub name: String,
    /// Reviews, newest first.
    pub reviews: Vec<ReviewResponse>,
}

/// Review listing response.
#[derive(Debug, Serialize)]
pub struct ListReviewsResponse {
    /// Products ordered by name, each with its reviews.
    pub products: Vec<ProductReviews>,
    /// Store alias that served the read.
    pub read_from: String,
}

/// List every product with its reviews.
pub async fn list_reviews_by_product(
    State(state): State<Arc<AppState>>,
    session: SessionHandle,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let last_write = state.sessions.load(session.id, now).last_write_time();

    let products = state.catalog.list_products()?;
    let routed = state.router.list_reviews(last_write, now)?;

    let mut by_product: HashMap<ProductId, Vec<ReviewResponse>> = HashMap::new();
    for review in &routed.value {
        by_product
            .entry(review.product_id)
            .or_default()
            .push(ReviewResponse::from(review));
    }

    let products = products
        .iter()
        .map(|product| ProductReviews {
            id: product.id.get(),
            name: product.name.clone(),
            reviews: by_product.remove(&product.id).unwrap_or_default(),
        })
        .collect();

    let response = ListReviewsResponse {
        products,
        read_from: routed.route.to_string(),
    };

    Ok(([(SESSION_HEADER, session.id.to_string())], Json(response)))
}

/// One product's reviews.
#[derive(Debug, Serialize)]
pub struct ProductReviewsResponse {
    /// The product.
    pub product: ProductResponse,
    /// Reviews, newest first.
    pub reviews: Vec<ReviewResponse>,
    /// Store alias that served the read.
    pub read_from: String,
}

/// List the reviews of one product.
pub async fn list_reviews_for_product(
    State(state): State<Arc<AppState>>,
    session: SessionHandle,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product_id: ProductId = product_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid product ID".into()))?;

    let product = state
        .catalog
        .get_product(product_id)?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {product_id}")))?;

    let now = Utc::now();
    let last_write = state.sessions.load(session.id, now).last_write_time();
    let routed = state
        .router
        .list_reviews_for_product(product_id, last_write, now)?;

    let response = ProductReviewsResponse {
        product: ProductResponse::from(&product),
        reviews: routed.value.iter().map(ReviewResponse::from).collect(),
        read_from: routed.route.to_string(),
    };

    Ok(([(SESSION_HEADER, session.id.to_string())], Json(response)))
}
