use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("YAML parse error: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("field not found: {0}")]
    RangeNotFound(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),

    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<&str> for EditorError {
    fn from(error: &str) -> Self {
        EditorError::ValidationError(error.to_string())
    }
}

impl EditorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EditorError::ParseError(_) | EditorError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            EditorError::Unauthorized => StatusCode::UNAUTHORIZED,
            EditorError::Forbidden(_) => StatusCode::FORBIDDEN,
            EditorError::NotFound(_) | EditorError::RangeNotFound(_) => StatusCode::NOT_FOUND,
            EditorError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EditorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
