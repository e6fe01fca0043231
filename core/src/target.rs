//! Target store - the upstream base URL the proxy forwards to

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the current upstream.
///
/// Clones refer to the same cell. The control endpoint is the only writer and
/// the forward handler reads it once per request, so a `set` that has returned
/// is visible to every request that starts afterwards.
#[derive(Debug, Clone)]
pub struct TargetStore {
    current: Arc<RwLock<String>>,
}

impl TargetStore {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub async fn get(&self) -> String {
        self.current.read().await.clone()
    }

    /// Replace the target unconditionally, returning the previous value.
    /// No normalization happens here.
    pub async fn set(&self, url: impl Into<String>) -> String {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, url.into())
    }
}

/// Prefix `http://` unless the string already carries an http(s) scheme.
pub fn normalize_target(raw: &str) -> String {
    let trimmed = raw.trim();
    if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn has_http_scheme(s: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        s.get(..scheme.len())
            .map(|head| head.eq_ignore_ascii_case(scheme))
            .unwrap_or(false)
    })
}
