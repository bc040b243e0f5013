// src/error.rs
// Error taxonomy shared by every handler and client. Remote-service
// failures are converted to JSON error responses at the handler boundary
// and never retried; the only fallback behavior lives in the candidate
// path probing of the Vimeo client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required credential or environment variable is missing.
    #[error("{0}")]
    Configuration(String),

    /// Every candidate resource path failed; message carries the
    /// concatenated per-candidate errors.
    #[error("{0}")]
    Fetch(String),

    /// Malformed or incomplete request input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate customer email on upload. The existing registry row is
    /// attached so the caller can decide to proceed anyway.
    #[error("Email already exists")]
    Conflict { existing: serde_json::Value },

    /// The remote service answered with a non-success status. The
    /// upstream status is mirrored back when it is a valid HTTP code.
    #[error("[{status}] {message}")]
    Remote { status: u16, message: String },
}

impl ApiError {
    pub fn remote(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        Self::Remote {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Remote {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => ApiError::Fetch(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Configuration(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
            ApiError::Fetch(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Conflict { existing } => (
                StatusCode::CONFLICT,
                json!({ "error": "Email already exists", "existing": existing }),
            ),
            ApiError::Remote { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                json!({ "error": message }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_mirrors_upstream_status() {
        let err = ApiError::Remote {
            status: 404,
            message: "not found".to_string(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bogus_remote_status_falls_back_to_500() {
        let err = ApiError::Remote {
            status: 42,
            message: "weird".to_string(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = ApiError::Conflict {
            existing: json!({ "email": "a@x.com" }),
        };
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
