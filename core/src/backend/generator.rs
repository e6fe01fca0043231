//! Reply generation behind a trait so a real model can replace the echo

use crate::backend::error::BackendError;
use crate::config::BackendModel;
use crate::protocol::{ChatMessage, ChatRole};

/// Sampling parameters taken from the chat request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

pub trait Generator: Send + Sync {
    /// Called once per model before its first generation
    fn prepare(&self, _model: &BackendModel) -> Result<(), BackendError> {
        Ok(())
    }

    /// Attach adapter weights to `base`. The echo backend has nothing to load.
    fn load_adapter(&self, _base: &BackendModel, _weights: &str) -> Result<(), BackendError> {
        Ok(())
    }

    /// Return the full completion: the prompt followed by generated text
    fn generate(
        &self,
        model: &BackendModel,
        messages: &[ChatMessage],
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, BackendError>;
}

/// Answers with the last user message, capped at `max_tokens` words
#[derive(Debug, Default, Clone)]
pub struct EchoGenerator;

impl Generator for EchoGenerator {
    fn generate(
        &self,
        model: &BackendModel,
        messages: &[ChatMessage],
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, BackendError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let reply = format!("[{}] {}", model.id, last_user)
            .split_whitespace()
            .take(params.max_tokens as usize)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(format!("{}{}", prompt, reply))
    }
}
