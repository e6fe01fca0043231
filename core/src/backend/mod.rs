//! Reference backend - local stand-in for the upstream inference service
//! Serves GET /models and POST /chat with the shapes the client expects

pub mod error;
pub mod generator;
pub mod prompt;
pub mod server;

pub use error::BackendError;
pub use generator::{EchoGenerator, Generator};
pub use server::BackendServer;
