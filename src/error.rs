//! Error types for the lifecycle engine and result stores

use crate::lifecycle::EntityKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LifecycleError
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Failures raised by lifecycle operations
///
/// Every variant except `Persistence` signals a bug in the calling
/// integration; none of them is retried or suppressed by the engine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// An empty identifier was used to register an entity
    #[error("entity identifier must not be empty")]
    NullIdentifier,

    /// No live entity is registered under the identifier
    #[error("{kind} with uuid {id} not found")]
    NotFound { id: String, kind: EntityKind },

    /// The identifier resolved to an entity of another kind
    #[error("entity with uuid {id} is a {found}, expected {expected}")]
    WrongKind {
        id: String,
        expected: EntityKind,
        found: EntityKind,
    },

    /// No test case, fixture or step is live under the identifier
    #[error("no running test case, fixture or step with uuid {id}")]
    NotRunning { id: String },

    /// The identifier resolved to a container, which holds no steps or attachments
    #[error("{found} with uuid {id} cannot hold steps or attachments")]
    NotExecutable { id: String, found: EntityKind },

    /// A context-implicit operation ran with nothing active on this thread
    #[error("could not {operation}: no test case, fixture or step is running on this thread")]
    EmptyContext { operation: &'static str },

    /// The result store failed to persist an entity or attachment
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl LifecycleError {
    pub fn not_found(id: impl Into<String>, kind: EntityKind) -> Self {
        Self::NotFound {
            id: id.into(),
            kind,
        }
    }

    pub fn empty_context(operation: &'static str) -> Self {
        Self::EmptyContext { operation }
    }
}

/// Result store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
