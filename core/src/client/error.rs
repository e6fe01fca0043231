use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL {input:?}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Invalid model listing: {0}")]
    InvalidListing(String),

    #[error("Invalid chat reply: {0}")]
    InvalidReply(String),

    #[error("No endpoint configured")]
    NotReady,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Failed to persist target: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
