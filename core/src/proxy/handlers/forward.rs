//! Forwarding handler
//! Handles <prefix> and <prefix>/*

use axum::{
    body::{self, Body},
    extract::State,
    http::{self, Request},
    response::Response,
};

use crate::proxy::error::ProxyError;
use crate::proxy::rewrite::{forwardable_headers, rewrite_path, upstream_url};
use crate::proxy::server::AppState;

/// Largest request body buffered before forwarding
pub const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Forward one request to whatever the target store holds right now
pub async fn handle_forward(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let request_id = uuid::Uuid::new_v4().simple().to_string();
    let (parts, body) = request.into_parts();

    let path = rewrite_path(&state.prefix, parts.uri.path())
        .ok_or_else(|| ProxyError::NotProxied(parts.uri.path().to_string()))?;

    let body = body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ProxyError::RequestBody(e.to_string()))?;

    // Resolved per request, never cached
    let target = state.target.get().await;
    let url = upstream_url(&target, &path, parts.uri.query());

    tracing::debug!(
        "[{}] {} {} -> {}",
        request_id,
        parts.method,
        parts.uri.path(),
        url
    );

    let response = match state
        .upstream
        .forward(parts.method.clone(), &url, forwardable_headers(&parts.headers), body)
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!("[{}] {}", request_id, e);
            return Err(e);
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::debug!("[{}] Upstream {} returned {}", request_id, url, status);
    }

    relay(response).await
}

/// Turn an upstream response into ours: status and end-to-end headers kept as-is
async fn relay(response: reqwest::Response) -> Result<Response, ProxyError> {
    let status = response.status();
    let headers = forwardable_headers(response.headers());
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProxyError::Relay(e.to_string()))?;

    let mut builder = http::Response::builder().status(status);
    if let Some(out) = builder.headers_mut() {
        *out = headers;
    }

    builder
        .body(Body::from(bytes))
        .map_err(|e| ProxyError::Relay(e.to_string()))
}
