//! Mapping of library errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::error::Error;

/// Error returned by request handlers.
///
/// Every library fault becomes a generic `500`; the cause is logged, not
/// shown to the client.
#[derive(Debug)]
pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Result type for request handlers.
pub type AppResult<T> = std::result::Result<T, AppError>;
