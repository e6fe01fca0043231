use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Errors surface as `{"detail": ...}`, the shape the upstream service uses
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Model {0} not supported")]
    UnsupportedModel(String),

    #[error("Model {0} requires HuggingFace authentication. Please set HF_TOKEN environment variable.")]
    AuthRequired(String),

    #[error("Error in inference: {0}")]
    Generation(String),

    #[error("Error loading LoRA model: {0}")]
    AdapterLoad(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl BackendError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedModel(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AuthRequired(_) | Self::Generation(_) | Self::AdapterLoad(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
