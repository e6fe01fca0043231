//! Path and header rewriting between the local prefix and the upstream

use axum::http::{header, HeaderMap, HeaderName};

/// Headers that only make sense for a single hop
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Strip `prefix` from `path`.
///
/// `/api/models` -> `/models`, `/api` -> `/`. Paths that merely share the
/// leading characters (`/apix`) are not under the prefix.
pub fn rewrite_path(prefix: &str, path: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

/// Join the current target with a rewritten path and the original query.
pub fn upstream_url(target: &str, rewritten_path: &str, query: Option<&str>) -> String {
    let base = target.trim_end_matches('/');
    match query {
        Some(qs) if !qs.is_empty() => format!("{}{}?{}", base, rewritten_path, qs),
        _ => format!("{}{}", base, rewritten_path),
    }
}

/// Copy end-to-end headers, dropping hop-by-hop ones, anything named by
/// `Connection`, plus `Host` and `Content-Length` which the client recomputes.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if is_hop_by_hop(name)
            || name == header::HOST
            || name == header::CONTENT_LENGTH
            || connection_listed.contains(name)
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn strips_prefix() {
        assert_eq!(rewrite_path("/api", "/api/models").as_deref(), Some("/models"));
        assert_eq!(rewrite_path("/api", "/api/v1/chat").as_deref(), Some("/v1/chat"));
        assert_eq!(rewrite_path("/api", "/api").as_deref(), Some("/"));
    }

    #[test]
    fn rejects_paths_outside_prefix() {
        assert_eq!(rewrite_path("/api", "/apix/models"), None);
        assert_eq!(rewrite_path("/api", "/models"), None);
    }

    #[test]
    fn joins_target_and_path() {
        assert_eq!(
            upstream_url("http://provider.example:9000", "/models", None),
            "http://provider.example:9000/models"
        );
        assert_eq!(
            upstream_url("http://host/", "/chat", Some("debug=1")),
            "http://host/chat?debug=1"
        );
        assert_eq!(upstream_url("http://host/base", "/models", Some("")), "http://host/base/models");
    }

    #[test]
    fn drops_hop_by_hop_and_connection_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:5173"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

        let out = forwardable_headers(&headers);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(out.get(header::AUTHORIZATION).unwrap(), "Bearer t");
    }

    #[test]
    fn keeps_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(header::ACCEPT, HeaderValue::from_static("application/json"));

        let out = forwardable_headers(&headers);
        assert_eq!(out.get_all(header::ACCEPT).iter().count(), 2);
    }
}
