use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid control request: {0}")]
    InvalidControlRequest(String),

    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("Path {0} is outside the proxied prefix")]
    NotProxied(String),

    #[error("Upstream request to {url} failed: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build upstream response: {0}")]
    Relay(String),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidControlRequest(_) | Self::RequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NotProxied(_) => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Relay(_) => StatusCode::BAD_GATEWAY,
            Self::ClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
