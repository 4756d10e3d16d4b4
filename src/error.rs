use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

/// Failures surfaced by the store and the REST handlers.
///
/// Every variant renders as `{"detail": "..."}`, the shape the booking pages
/// and the HTTP client read error messages from.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Not authenticated")]
    Unauthorized,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Message safe to show to a client; internal causes are redacted.
    pub fn detail(&self) -> String {
        match self {
            Self::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("Request failed: {self}");
        }
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.detail() }))
    }
}
