//! Embedded browser client

use axum::{extract::State, response::Html};

use crate::proxy::server::AppState;

const INDEX_TEMPLATE: &str = include_str!("../../web/index.html");

/// Fill the page's path placeholders so it talks to this server's layout
pub fn render_index(prefix: &str, control_path: &str) -> String {
    INDEX_TEMPLATE
        .replace("__API_PREFIX__", prefix)
        .replace("__CONTROL_PATH__", control_path)
}

/// Handle GET /
pub async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(state.index_page.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_paths() {
        let page = render_index("/backend", "/__retarget");
        assert!(page.contains("\"/backend\""));
        assert!(page.contains("\"/__retarget\""));
        assert!(!page.contains("__API_PREFIX__"));
        assert!(!page.contains("__CONTROL_PATH__"));
    }
}
