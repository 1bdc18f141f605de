//! Container session: binding the gateway to one public container

use std::sync::Arc;

use cdngate_store::{ContainerHandle, RemoteStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GatewayError;

/// Immutable view of a container handed to blobs at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub name: String,
    pub cdn_uri: Option<String>,
    pub cdn_ssl_uri: Option<String>,
}

impl ContainerRef {
    /// Public and secure URIs of an object in this container
    pub fn uris_for(&self, name: &str) -> (Option<String>, Option<String>) {
        (
            self.cdn_uri.as_ref().map(|base| format!("{}/{}", base, name)),
            self.cdn_ssl_uri
                .as_ref()
                .map(|base| format!("{}/{}", base, name)),
        )
    }
}

impl From<&ContainerHandle> for ContainerRef {
    fn from(handle: &ContainerHandle) -> Self {
        Self {
            name: handle.name.clone(),
            cdn_uri: handle.cdn_uri.clone(),
            cdn_ssl_uri: handle.cdn_ssl_uri.clone(),
        }
    }
}

/// Account usage together with the bound container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub total_containers: u64,
    pub total_bytes: u64,
    pub container: ContainerHandle,
}

/// Holds the container the gateway currently works with
pub struct ContainerSession {
    store: Arc<dyn RemoteStore>,
    container: Option<ContainerHandle>,
}

impl ContainerSession {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            container: None,
        }
    }

    /// Resolve `name`, creating it if absent, and make it public with `ttl`.
    ///
    /// Publishing is re-applied on every bind. Store failures other than
    /// "container not found" propagate and leave the previous binding intact.
    pub async fn bind(&mut self, name: &str, ttl: u64) -> Result<&ContainerHandle, GatewayError> {
        let handle = match self.store.get_container(name).await {
            Ok(handle) => handle,
            Err(e) if e.is_not_found() => {
                debug!("Container {} not found, creating it", name);
                self.store.create_container(name).await?
            }
            Err(e) => return Err(e.into()),
        };

        let handle = self.store.make_public(&handle, ttl).await?;
        info!("Bound container {} (public, ttl {}s)", handle.name, ttl);

        Ok(self.container.insert(handle))
    }

    /// Clear the bound container, returning it
    pub fn unbind(&mut self) -> Option<ContainerHandle> {
        self.container.take()
    }

    pub fn container(&self) -> Option<&ContainerHandle> {
        self.container.as_ref()
    }

    /// The bound container, or `NoContainerBound`
    pub fn require(&self) -> Result<&ContainerHandle, GatewayError> {
        self.container.as_ref().ok_or(GatewayError::NoContainerBound)
    }

    /// Snapshot of the bound container for new blobs
    pub fn snapshot(&self) -> Option<ContainerRef> {
        self.container.as_ref().map(ContainerRef::from)
    }

    /// Account usage and the bound container
    pub async fn info(&self) -> Result<GatewayInfo, GatewayError> {
        let container = self.require()?;
        let account = self.store.account_info().await?;
        Ok(GatewayInfo {
            total_containers: account.total_containers,
            total_bytes: account.total_bytes,
            container: container.clone(),
        })
    }
}
