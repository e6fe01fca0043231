//! chat-relay core library
//! Retargetable dev proxy, chat client and reference backend

pub mod backend;
pub mod client;
pub mod config;
pub mod protocol;
pub mod proxy;
pub mod target;

pub use target::{normalize_target, TargetStore};
