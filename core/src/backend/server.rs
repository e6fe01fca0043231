//! Backend Server - Axum HTTP server for the reference backend

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::generator::{GenerationParams, Generator};
use crate::backend::prompt::{extract_reply, format_chat_prompt};
use crate::config::BackendModel;
use crate::protocol::{ChatRequest, ChatResponse, ModelList};

#[derive(Clone)]
pub struct BackendState {
    models: Arc<Vec<BackendModel>>,
    hf_token: Option<String>,
    generator: Arc<dyn Generator>,
    /// model id (or `<id>_lora`) -> prepared
    prepared: Arc<DashMap<String, ()>>,
}

pub struct BackendServer {
    host: String,
    port: u16,
    state: BackendState,
}

impl BackendServer {
    pub fn new(
        host: String,
        port: u16,
        models: Vec<BackendModel>,
        hf_token: Option<String>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        if hf_token.is_none() {
            tracing::warn!("HF_TOKEN not set. Models requiring authentication will be refused.");
        }

        let state = BackendState {
            models: Arc::new(models),
            hf_token,
            generator,
            prepared: Arc::new(DashMap::new()),
        };
        Self { host, port, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/models", get(handle_list_models))
            .route("/chat", post(handle_chat))
            .route("/load_lora", post(handle_load_lora))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Whether `key` has been prepared, e.g. `dobby-8b` or `dobby-8b_lora`
    pub fn is_loaded(&self, key: &str) -> bool {
        self.state.prepared.contains_key(key)
    }

    /// Run the backend server (blocking)
    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Backend listening on {}", addr);
        for model in self.state.models.iter() {
            tracing::info!("  {} ({}){}", model.id, model.name, if model.requires_auth { " [auth]" } else { "" });
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(crate::proxy::server::shutdown_signal())
            .await?;

        tracing::info!("Backend stopped");
        Ok(())
    }
}

/// Handle GET /models
async fn handle_list_models(State(state): State<BackendState>) -> Json<ModelList> {
    Json(ModelList {
        available_models: state.models.iter().map(|m| m.id.clone()).collect(),
    })
}

/// Handle POST /chat
async fn handle_chat(
    State(state): State<BackendState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, BackendError> {
    let Json(request) = payload.map_err(|e| BackendError::InvalidRequest(e.body_text()))?;

    let model = state
        .models
        .iter()
        .find(|m| m.id == request.model)
        .cloned()
        .ok_or_else(|| BackendError::UnsupportedModel(request.model.clone()))?;
    ensure_authorized(&state, &model)?;

    tracing::info!(
        "Chat request: model={} messages={} temperature={} max_tokens={}",
        model.id,
        request.messages.len(),
        request.temperature(),
        request.max_tokens()
    );

    let params = GenerationParams {
        temperature: request.temperature(),
        max_tokens: request.max_tokens(),
    };

    let full_text = tokio::task::spawn_blocking(move || {
        if !state.prepared.contains_key(&model.id) {
            tracing::info!("Loading model {} for the first time...", model.name);
            state.generator.prepare(&model)?;
            state.prepared.insert(model.id.clone(), ());
        }

        let prompt = format_chat_prompt(&request.messages);
        state.generator.generate(&model, &request.messages, &prompt, params)
    })
    .await
    .map_err(|e| BackendError::Generation(e.to_string()))??;

    Ok(Json(ChatResponse {
        response: extract_reply(&full_text),
    }))
}

#[derive(Debug, Deserialize)]
struct LoadAdapterParams {
    base_model: String,
    lora_weights: String,
}

/// Handle POST /load_lora?base_model=..&lora_weights=..
///
/// `base_model` may be a registry id or its HuggingFace name. On success the
/// adapted model is recorded as `<id>_lora`.
async fn handle_load_lora(
    State(state): State<BackendState>,
    params: Result<Query<LoadAdapterParams>, QueryRejection>,
) -> Result<Json<Value>, BackendError> {
    let Query(params) = params.map_err(|e| BackendError::InvalidRequest(e.body_text()))?;

    let model = state
        .models
        .iter()
        .find(|m| m.id == params.base_model || m.name == params.base_model)
        .cloned()
        .ok_or_else(|| {
            BackendError::AdapterLoad(format!("Model {} not supported", params.base_model))
        })?;
    ensure_authorized(&state, &model)?;

    let weights = params.lora_weights.trim().to_string();
    if weights.is_empty() {
        return Err(BackendError::AdapterLoad("lora_weights is empty".to_string()));
    }

    let key = format!("{}_lora", model.id);
    tracing::info!("Loading adapter {} onto {} as {}", weights, model.name, key);

    tokio::task::spawn_blocking(move || {
        state.generator.load_adapter(&model, &weights)?;
        state.prepared.insert(key, ());
        Ok::<_, BackendError>(())
    })
    .await
    .map_err(|e| BackendError::AdapterLoad(e.to_string()))??;

    Ok(Json(json!({ "message": "LoRA model loaded successfully" })))
}

fn ensure_authorized(state: &BackendState, model: &BackendModel) -> Result<(), BackendError> {
    if model.requires_auth && state.hf_token.is_none() {
        return Err(BackendError::AuthRequired(model.id.clone()));
    }
    Ok(())
}
