//! Chat client session: configuration, model listing and message exchange
//! against the local proxy. The client never talks to the upstream directly.

use reqwest::{Client, Url};
use serde_json::{json, Value};
use tokio::sync::watch;

use crate::client::error::ClientError;
use crate::client::state::ClientState;
use crate::client::storage::TargetStorage;
use crate::config::Config;
use crate::protocol::{ChatMessage, ChatRequest};

/// Transcript entry appended when a send fails for any reason
pub const FALLBACK_REPLY: &str = "Sorry, there was an error processing your request.";

pub struct ChatClient<S: TargetStorage> {
    http: Client,
    proxy_url: String,
    prefix: String,
    control_path: String,
    storage: S,
    state: watch::Sender<ClientState>,
    transcript: Vec<ChatMessage>,
}

impl<S: TargetStorage> ChatClient<S> {
    /// `proxy_url` is the local proxy origin, e.g. `http://127.0.0.1:5173`.
    /// No request timeout is set; a hung upstream hangs the call.
    pub fn new(
        proxy_url: impl Into<String>,
        prefix: impl Into<String>,
        control_path: impl Into<String>,
        storage: S,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().build().map_err(ClientError::ClientBuild)?;
        let (state, _) = watch::channel(ClientState::unconfigured());

        Ok(Self {
            http,
            proxy_url: proxy_url.into().trim_end_matches('/').to_string(),
            prefix: prefix.into(),
            control_path: control_path.into(),
            storage,
            state,
            transcript: Vec::new(),
        })
    }

    pub fn from_config(config: &Config, storage: S) -> Result<Self, ClientError> {
        Self::new(
            config.client.proxy_url.clone(),
            config.proxy.prefix.clone(),
            config.proxy.control_path.clone(),
            storage,
        )
    }

    pub fn state(&self) -> ClientState {
        self.state.borrow().clone()
    }

    /// Observe state changes, including the transient Configuring/Probing steps
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn saved_target(&self) -> Option<String> {
        self.storage.load()
    }

    /// Startup: reuse a saved target if there is one, skipping the form.
    pub async fn resume(&mut self) -> ClientState {
        let Some(saved) = self.storage.load() else {
            self.set_state(ClientState::unconfigured());
            return self.state();
        };

        tracing::info!("Resuming with saved target {}", saved);
        self.set_state(ClientState::Probing);

        match self.submit_and_probe(&saved).await {
            Ok(models) => self.become_ready(models),
            Err(e) => {
                tracing::warn!("Model listing failed: {}", e);
                self.set_state(ClientState::Error {
                    message: format!("Failed to load models: {}", e),
                });
            }
        }
        self.state()
    }

    /// The error panel's retry: start over as if the client had just loaded
    pub async fn retry(&mut self) -> ClientState {
        self.transcript.clear();
        self.resume().await
    }

    /// Submit a candidate target, then probe the model listing through the proxy.
    ///
    /// A failed probe clears any previously saved target; it is not restored.
    pub async fn configure(&mut self, candidate: &str) -> ClientState {
        let candidate = candidate.trim();
        if let Err(e) = Url::parse(candidate) {
            let err = ClientError::InvalidUrl {
                input: candidate.to_string(),
                reason: e.to_string(),
            };
            self.set_state(ClientState::Unconfigured {
                error: Some(err.to_string()),
            });
            return self.state();
        }

        self.set_state(ClientState::Configuring);
        match self.submit_and_probe(candidate).await {
            Ok(models) => {
                if let Err(e) = self.storage.save(candidate) {
                    tracing::warn!("Failed to save target: {}", e);
                }
                self.become_ready(models);
            }
            Err(e) => {
                tracing::warn!("Configuration of {} failed: {}", candidate, e);
                if let Err(e) = self.storage.clear() {
                    tracing::warn!("Failed to clear saved target: {}", e);
                }
                self.set_state(ClientState::Unconfigured {
                    error: Some(format!("Failed to connect: {}", e)),
                });
            }
        }
        self.state()
    }

    /// Back to the configuration form without touching the saved target
    pub fn reconfigure(&mut self) {
        self.set_state(ClientState::unconfigured());
    }

    pub fn select_model(&mut self, model: &str) -> Result<(), ClientError> {
        let ClientState::Ready { models, .. } = self.state() else {
            return Err(ClientError::NotReady);
        };
        if !models.iter().any(|m| m == model) {
            return Err(ClientError::UnknownModel(model.to_string()));
        }
        self.set_state(ClientState::Ready {
            models,
            selected: model.to_string(),
        });
        Ok(())
    }

    /// Send a user message and append the reply.
    ///
    /// The user entry is appended before any network traffic and stays even if
    /// the request fails, in which case exactly one fallback entry follows it.
    pub async fn send(&mut self, text: &str) -> Result<&ChatMessage, ClientError> {
        let model = self
            .state
            .borrow()
            .selected_model()
            .map(str::to_string)
            .ok_or(ClientError::NotReady)?;
        if text.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        self.transcript.push(ChatMessage::user(text));
        let request = ChatRequest::new(self.transcript.clone(), model);

        let reply = match self.request_reply(&request).await {
            Ok(content) => ChatMessage::assistant(content),
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                ChatMessage::assistant(FALLBACK_REPLY)
            }
        };
        self.transcript.push(reply);

        self.transcript.last().ok_or(ClientError::NotReady)
    }

    fn set_state(&self, state: ClientState) {
        self.state.send_replace(state);
    }

    fn become_ready(&mut self, models: Vec<String>) {
        self.transcript.clear();
        let selected = models[0].clone();
        tracing::info!("{} model(s) available, selected {}", models.len(), selected);
        self.set_state(ClientState::Ready { models, selected });
    }

    fn control_url(&self) -> String {
        format!("{}{}", self.proxy_url, self.control_path)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.proxy_url, self.prefix, path)
    }

    async fn submit_and_probe(&self, target: &str) -> Result<Vec<String>, ClientError> {
        self.submit_target(target).await?;
        self.set_state(ClientState::Probing);
        self.fetch_models().await
    }

    async fn submit_target(&self, target: &str) -> Result<(), ClientError> {
        let url = self.control_url();
        let response = self
            .http
            .post(&url)
            .json(&json!({ "target": target }))
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;
        check_status(&url, response).await.map(|_| ())
    }

    async fn fetch_models(&self) -> Result<Vec<String>, ClientError> {
        let url = self.api_url("/models");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;
        let body = check_status(&url, response).await?;
        parse_model_listing(&body)
    }

    async fn request_reply(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let url = self.api_url("/chat");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;
        let body = check_status(&url, response).await?;
        parse_chat_reply(&body)
    }
}

async fn check_status(url: &str, response: reqwest::Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(|source| ClientError::Http {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: describe_error_body(&body),
        });
    }
    Ok(body)
}

/// Pull `error` or `detail` out of a JSON error body, else keep it short
fn describe_error_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("detail"))
                .and_then(|e| e.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// `{"available_models": [..strings..]}` with at least one entry
pub fn parse_model_listing(body: &str) -> Result<Vec<String>, ClientError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ClientError::InvalidListing(e.to_string()))?;

    let list = value
        .get("available_models")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ClientError::InvalidListing("missing available_models array".to_string()))?;

    let models = list
        .iter()
        .map(|m| m.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ClientError::InvalidListing("non-string model identifier".to_string()))?;

    if models.is_empty() {
        return Err(ClientError::InvalidListing("no models available".to_string()));
    }
    Ok(models)
}

/// `{"response": "..."}`
pub fn parse_chat_reply(body: &str) -> Result<String, ClientError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ClientError::InvalidReply(e.to_string()))?;
    value
        .get("response")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ClientError::InvalidReply("missing response field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryTargetStorage;

    #[test]
    fn listing_selects_from_array() {
        let models = parse_model_listing(r#"{"available_models": ["a", "b"]}"#).unwrap();
        assert_eq!(models, vec!["a", "b"]);
    }

    #[test]
    fn listing_rejects_bad_shapes() {
        for body in [
            "{}",
            r#"{"available_models": "a"}"#,
            r#"{"available_models": [1, 2]}"#,
            r#"{"available_models": []}"#,
            "<html>",
        ] {
            assert!(
                matches!(parse_model_listing(body), Err(ClientError::InvalidListing(_))),
                "{} should be rejected",
                body
            );
        }
    }

    #[test]
    fn reply_requires_response_string() {
        assert_eq!(parse_chat_reply(r#"{"response": "hey"}"#).unwrap(), "hey");
        assert!(parse_chat_reply(r#"{"detail": "boom"}"#).is_err());
        assert!(parse_chat_reply(r#"{"response": 3}"#).is_err());
    }

    #[test]
    fn error_body_description() {
        assert_eq!(describe_error_body(r#"{"error": "bad target"}"#), "bad target");
        assert_eq!(describe_error_body(r#"{"detail": "Model x not supported"}"#), "Model x not supported");
        assert_eq!(describe_error_body("plain"), "plain");
    }

    #[tokio::test]
    async fn invalid_url_stays_on_form_without_network() {
        // Port 9 is never contacted: validation fails first
        let mut client = ChatClient::new(
            "http://127.0.0.1:9",
            "/api",
            "/__proxy/target",
            MemoryTargetStorage::new(Some("http://kept".to_string())),
        )
        .unwrap();

        let state = client.configure("not a url").await;
        match state {
            ClientState::Unconfigured { error: Some(msg) } => assert!(msg.contains("Invalid URL")),
            other => panic!("unexpected state {:?}", other),
        }
        assert_eq!(client.saved_target().as_deref(), Some("http://kept"));
    }

    #[tokio::test]
    async fn send_requires_ready_state() {
        let mut client = ChatClient::new(
            "http://127.0.0.1:9",
            "/api",
            "/__proxy/target",
            MemoryTargetStorage::default(),
        )
        .unwrap();

        assert!(matches!(client.send("hi").await, Err(ClientError::NotReady)));
        assert!(client.transcript().is_empty());
        assert!(matches!(client.select_model("a"), Err(ClientError::NotReady)));
    }

    #[tokio::test]
    async fn resume_without_saved_target_shows_form() {
        let mut client = ChatClient::new(
            "http://127.0.0.1:9",
            "/api",
            "/__proxy/target",
            MemoryTargetStorage::default(),
        )
        .unwrap();

        assert_eq!(client.resume().await, ClientState::unconfigured());
    }
}
