//! Proxy module - development reverse proxy with a runtime-switchable upstream

pub mod error;
pub mod handlers;
pub mod rewrite;
pub mod server;
pub mod ui;
pub mod upstream;

pub use error::ProxyError;
pub use server::{AppState, ProxyServer};
