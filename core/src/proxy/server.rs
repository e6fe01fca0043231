//! Proxy Server - Axum HTTP server

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{any, get, post},
    Router,
};
use tokio::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, UiConfig};
use crate::proxy::error::ProxyError;
use crate::proxy::handlers::{control, forward};
use crate::proxy::ui;
use crate::proxy::upstream::UpstreamClient;
use crate::target::TargetStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub target: TargetStore,
    pub upstream: Arc<UpstreamClient>,
    pub prefix: Arc<str>,
    pub index_page: Arc<str>,
}

/// Proxy server instance
pub struct ProxyServer {
    host: String,
    port: u16,
    control_path: String,
    ui_dir: Option<std::path::PathBuf>,
    state: AppState,
}

impl ProxyServer {
    pub fn new(
        host: String,
        port: u16,
        target: TargetStore,
        proxy: &ProxyConfig,
        ui: &UiConfig,
    ) -> Result<Self, ProxyError> {
        let upstream = Arc::new(UpstreamClient::new(
            proxy.connect_timeout.map(Duration::from_secs),
        )?);

        let state = AppState {
            target,
            upstream,
            prefix: Arc::from(proxy.prefix.as_str()),
            index_page: Arc::from(ui::render_index(&proxy.prefix, &proxy.control_path)),
        };

        Ok(Self {
            host,
            port,
            control_path: proxy.control_path.clone(),
            ui_dir: ui.directory.clone(),
            state,
        })
    }

    pub fn target(&self) -> &TargetStore {
        &self.state.target
    }

    /// Build the router. Exposed so tests can serve it on an ephemeral port.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let prefix = self.state.prefix.to_string();

        let mut app = Router::new()
            // Health check
            .route("/healthz", get(health_check_handler))
            .route("/health", get(health_check_handler))

            // Side channel for retargeting
            .route(&self.control_path, post(control::handle_set_target))

            // Everything under the prefix goes upstream
            .route(&prefix, any(forward::handle_forward))
            // `/*rest` does not match an empty segment
            .route(&format!("{}/", prefix), any(forward::handle_forward))
            .route(&format!("{}/*rest", prefix), any(forward::handle_forward));

        app = match &self.ui_dir {
            Some(dir) => app.fallback_service(
                ServeDir::new(dir).append_index_html_on_directories(true),
            ),
            None => app.route("/", get(ui::handle_index)),
        };

        app.layer(DefaultBodyLimit::max(forward::MAX_BODY_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the proxy server (blocking)
    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Proxy server listening on {}", addr);
        tracing::warn!(
            "Control endpoint {} is unauthenticated; anyone who can reach it can redirect proxied traffic",
            self.control_path
        );

        // Handle graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Proxy server stopped");
        Ok(())
    }
}

/// Health check handler
async fn health_check_handler(State(state): State<AppState>) -> Response {
    let target = state.target.get().await;
    (StatusCode::OK, Json(serde_json::json!({"status": "ok", "target": target}))).into_response()
}

/// Shutdown signal handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
