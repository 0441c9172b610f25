//! API error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable reason.
    #[schema(example = "no mining work available yet")]
    pub error: String,
}

/// API errors.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request input.
    BadRequest(String),
    /// The requested resource is unavailable.
    NotFound(String),
    /// Internal failure.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message().to_string(),
        });
        (self.status(), body).into_response()
    }
}

impl From<olivetum_mining::MiningError> for ApiError {
    fn from(err: olivetum_mining::MiningError) -> Self {
        match err {
            olivetum_mining::MiningError::NoWork => ApiError::NotFound(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
