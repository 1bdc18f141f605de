//! Value types exchanged with a remote store

use serde::{Deserialize, Serialize};

/// A container as reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHandle {
    /// Container name
    pub name: String,
    /// Whether the container is served publicly through the CDN
    pub public: bool,
    /// CDN time-to-live in seconds, once the container is public
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Base URI for public serving
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_uri: Option<String>,
    /// Base URI for secure (TLS) serving
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_ssl_uri: Option<String>,
}

impl ContainerHandle {
    /// A freshly created, private container
    pub fn private(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public: false,
            ttl: None,
            cdn_uri: None,
            cdn_ssl_uri: None,
        }
    }
}

/// An object inside a container
///
/// `content_type` is applied to the remote side on the next write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub container: String,
    pub name: String,
    pub content_type: Option<String>,
    /// Stored size in bytes, unknown for objects not yet written
    pub size: Option<u64>,
}

impl RemoteObject {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
            content_type: None,
            size: None,
        }
    }
}

/// Account-level usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub total_containers: u64,
    pub total_bytes: u64,
}

/// Result of writing object contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub name: String,
    /// Entity tag reported by the store, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub size: u64,
}
