pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod results;
pub mod store;
pub mod time;

pub use error::{LifecycleError, Result, StoreError};
pub use lifecycle::{ContextSnapshot, EntityKind, Lifecycle, LifecycleListener};
pub use store::{FileSystemStore, InMemoryStore, ResultStore, ResultsReader};
