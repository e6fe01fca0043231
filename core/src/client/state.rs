//! Which panel the client shows

#[derive(Debug, Clone, PartialEq)]
pub enum ClientState {
    /// Configuration form; `error` holds the last failed attempt
    Unconfigured { error: Option<String> },
    /// Submitting the candidate to the control endpoint
    Configuring,
    /// Listing models through the repointed proxy
    Probing,
    Ready { models: Vec<String>, selected: String },
    /// Full-panel failure of the startup model listing, cleared by retry
    Error { message: String },
}

impl ClientState {
    pub fn unconfigured() -> Self {
        Self::Unconfigured { error: None }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn selected_model(&self) -> Option<&str> {
        match self {
            Self::Ready { selected, .. } => Some(selected),
            _ => None,
        }
    }

    pub fn models(&self) -> &[String] {
        match self {
            Self::Ready { models, .. } => models,
            _ => &[],
        }
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::unconfigured()
    }
}
