//! Error types for remote store backends

use thiserror::Error;

/// Errors that can occur while talking to a remote store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Object not found: {container}/{name}")]
    ObjectNotFound { container: String, name: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether the error means the requested container or object is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ContainerNotFound(_) | StoreError::ObjectNotFound { .. }
        )
    }

    pub(crate) fn object_not_found(container: &str, name: &str) -> Self {
        StoreError::ObjectNotFound {
            container: container.to_string(),
            name: name.to_string(),
        }
    }
}
