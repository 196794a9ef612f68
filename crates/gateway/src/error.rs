//! API error types and their JSON responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors returned by gateway handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An error from the balancer.
    #[error(transparent)]
    Balancer(#[from] corelib::Error),

    /// The client exceeded its request budget.
    #[error("too many requests")]
    RateLimited,
}

impl ApiError {
    /// Map to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Balancer(e) => match e {
                corelib::Error::InvalidAddress { .. } | corelib::Error::Unreachable { .. } => {
                    StatusCode::NOT_ACCEPTABLE
                }
                corelib::Error::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                corelib::Error::HashEncoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Balancer(e) => (
                status,
                Json(json!({
                    "status": "error",
                    "reason": e.reason(),
                    "message": e.to_string(),
                })),
            )
                .into_response(),
            Self::RateLimited => (
                status,
                [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
                json!({ "error": "too many requests" }).to_string(),
            )
                .into_response(),
        }
    }
}
