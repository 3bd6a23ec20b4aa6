use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures raised by the code registry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("short code '{0}' not found")]
    NotFound(String),

    /// Every freshly drawn code collided with a live one. Not expected to
    /// happen with a 32-bit code space and a modest number of records.
    #[error("no free short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidUrl(String),

    #[error("URL not found")]
    NotFound(String),

    #[error("internal error")]
    Internal(String),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(code) => ApiError::NotFound(code),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(detail) => tracing::error!("Internal error: {}", detail),
            ApiError::NotFound(code) => tracing::debug!("Short code '{}' not found", code),
            ApiError::InvalidUrl(msg) => tracing::debug!("Rejected URL: {}", msg),
        }

        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
