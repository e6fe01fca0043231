pub mod control;
pub mod forward;
