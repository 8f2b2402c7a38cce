use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::feed::FetchError;

/// Errors returned by API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The feed could not be fetched or parsed
    #[error("Error fetching articles: {0}")]
    Fetch(#[from] FetchError),
}

/// API error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Fetch(e) => {
                tracing::error!(error = %e, "Error getting articles for API");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error fetching articles".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
