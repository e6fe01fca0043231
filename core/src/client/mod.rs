//! Chat client - drives the configuration form and chat panel through the proxy

pub mod error;
pub mod session;
pub mod state;
pub mod storage;

pub use error::ClientError;
pub use session::{ChatClient, FALLBACK_REPLY};
pub use state::ClientState;
pub use storage::{FileTargetStorage, MemoryTargetStorage, TargetStorage};
