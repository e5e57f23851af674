//! API error types and the response envelope.
//!
//! Every error response is `{ "success": false, "error": "..." }` with a
//! status reflecting the failure class. Internal faults never expose
//! detail to the caller; the detail is logged for operators instead.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Gateway-facing errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input (400). Rejected before any cache or engine work.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication required (401).
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Access forbidden (403).
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Unexpected internal fault (500). The payload is the operator-facing
    /// detail, never sent to the caller.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "unexpected internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let response = ApiError::BadRequest("resource must not be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_hides_detail() {
        let response = ApiError::Internal("backend blew up at line 42".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
