// Commands module - handles CLI command execution

pub mod config;
pub mod summary;

pub use config::handle_config;
pub use summary::{Summary, handle_summary};
