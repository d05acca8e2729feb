//! API error type and ActraError → HTTP status mapping.

use actra_core::ActraError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// API error with HTTP status code and stable error code.
#[derive(Debug)]
pub struct ApiError {
    /// Stable error code (e.g. `NOT_FOUND`).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: StatusCode,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message, StatusCode::NOT_FOUND)
    }

    /// Convert to HTTP response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let body = serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "status": self.status.as_u16()
            }
        });

        Response::builder()
            .status(self.status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("response builder should not fail")
    }
}

impl From<ActraError> for ApiError {
    fn from(err: ActraError) -> Self {
        let status = match &err {
            ActraError::NotFound { .. } => StatusCode::NOT_FOUND,
            ActraError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ActraError::Conflict { .. } => StatusCode::CONFLICT,
            ActraError::Validation { .. } | ActraError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            status,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
