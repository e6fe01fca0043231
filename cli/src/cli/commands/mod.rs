pub mod backend;
pub mod chat;
pub mod start;
pub mod status;
pub mod target;
