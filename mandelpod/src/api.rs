use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use health::InvalidStateName;

/// Request-scoped failures. None of these touch the health indicator or
/// outlive the request that triggered them.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    InvalidStateName(#[from] InvalidStateName),

    #[error("failed to resolve local host name: {0}")]
    HostResolution(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidStateName(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::HostResolution(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        }
        .into_response()
    }
}
