//! Control endpoint - repoints the proxy at a new upstream
//!
//! Unauthenticated: anyone who can reach this path redirects every later
//! proxied request. Only ever bind it where that is acceptable.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::proxy::error::ProxyError;
use crate::proxy::server::AppState;
use crate::target::normalize_target;

#[derive(Debug, Deserialize)]
struct TargetUpdate {
    target: String,
}

/// Handle POST <control_path>
pub async fn handle_set_target(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ProxyError> {
    let update = parse_update(&body)?;
    let target = normalize_target(&update.target);

    // Written before responding: once the caller sees 200 every new request uses it
    let previous = state.target.set(target.clone()).await;
    tracing::info!("Proxy target changed: {} -> {}", previous, target);

    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}

fn parse_update(body: &[u8]) -> Result<TargetUpdate, ProxyError> {
    let update: TargetUpdate = serde_json::from_slice(body)
        .map_err(|e| ProxyError::InvalidControlRequest(e.to_string()))?;

    if update.target.trim().is_empty() {
        return Err(ProxyError::InvalidControlRequest(
            "target must not be empty".to_string(),
        ));
    }
    Ok(update)
}
