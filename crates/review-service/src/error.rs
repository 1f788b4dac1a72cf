//! API error types and responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A storage partition could not be reached.
    #[error("partition unavailable: {partition}")]
    PartitionUnavailable {
        /// Alias of the failing partition.
        partition: String,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::PartitionUnavailable { partition } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "partition_unavailable",
                self.to_string(),
                Some(serde_json::json!({ "partition": partition })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<review_store::StoreError> for ApiError {
    fn from(err: review_store::StoreError) -> Self {
        match err {
            review_store::StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            review_store::StoreError::Duplicate { id } => {
                Self::Conflict(format!("review {id} already exists"))
            }
            review_store::StoreError::PartitionUnavailable { partition, message } => {
                tracing::error!(partition = %partition, error = %message, "Partition unavailable");
                Self::PartitionUnavailable { partition }
            }
            review_store::StoreError::Database(msg)
            | review_store::StoreError::Serialization(msg)
            | review_store::StoreError::Configuration(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<review_core::ReviewError> for ApiError {
    fn from(err: review_core::ReviewError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
