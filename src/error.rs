use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum KvMeshError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, KvMeshError>;

impl From<std::io::Error> for KvMeshError {
    fn from(e: std::io::Error) -> Self {
        KvMeshError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for KvMeshError {
    fn from(e: serde_json::Error) -> Self {
        KvMeshError::Json(e.to_string())
    }
}

impl KvMeshError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            KvMeshError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            KvMeshError::KeyNotFound(_) => StatusCode::NOT_FOUND,
            KvMeshError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KvMeshError::Json(_) => StatusCode::BAD_REQUEST,
            KvMeshError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            KvMeshError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            KvMeshError::InvalidKey(_) => "invalid_key",
            KvMeshError::KeyNotFound(_) => "key_not_found",
            KvMeshError::InvalidRequest(_) => "invalid_request",
            KvMeshError::Json(_) => "json_error",
            KvMeshError::Config(_) => "config_error",
            KvMeshError::Io(_) => "io_error",
        }
    }
}

// Axum IntoResponse implementation (feature-gated)
#[cfg(feature = "axum-support")]
use axum::response::{IntoResponse, Json, Response};
#[cfg(feature = "axum-support")]
use serde::Serialize;

#[cfg(feature = "axum-support")]
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub request_id: String,
}

#[cfg(feature = "axum-support")]
impl IntoResponse for KvMeshError {
    fn into_response(self) -> Response {
        let message = match &self {
            KvMeshError::KeyNotFound(key) => format!("Key '{}' does not exist", key),
            other => other.to_string(),
        };

        let error_response = ErrorResponse {
            error: self.error_code().to_string(),
            message,
            request_id: format!("req_kv_{}", uuid::Uuid::new_v4()),
        };

        (self.status_code(), Json(error_response)).into_response()
    }
}
