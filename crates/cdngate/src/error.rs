//! Error types for the gateway

use cdngate_store::StoreError;
use thiserror::Error;

/// Errors raised by gateway, container session and blob operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No container bound to the gateway")]
    NoContainerBound,

    #[error("Blob should be named")]
    MissingBlobName,

    #[error("Blob cannot be empty on save")]
    EmptyBlobContent,

    #[error("File extension could not be determined for blob '{0}'")]
    UnrecognizedBlobName(String),

    #[error("Deletion of the current container was not confirmed")]
    ConfirmationRequired,

    #[error("Failed to delete {} blob(s) from container '{container}'", failed.len())]
    CascadeIncomplete {
        container: String,
        failed: Vec<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_incomplete_message() {
        let err = GatewayError::CascadeIncomplete {
            container: "assets".to_string(),
            failed: vec!["a.png".to_string(), "b.js".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Failed to delete 2 blob(s) from container 'assets'"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: GatewayError = StoreError::Transport("timed out".to_string()).into();
        assert_eq!(err.to_string(), "Transport error: timed out");
    }
}
