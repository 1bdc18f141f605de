//! Gateway: the top-level facade over one container

use std::sync::Arc;

use cdngate_store::{ContainerHandle, RemoteStore};
use serde_json::Value;
use tracing::{info, warn};

use super::blob::Blob;
use super::config::{CascadePolicy, GatewayConfig, GatewayInputConfig, DELETE_CONFIRMATION};
use super::session::{ContainerSession, GatewayInfo};
use crate::error::GatewayError;

/// CDN gateway bound to at most one container at a time
pub struct Gateway {
    store: Arc<dyn RemoteStore>,
    config: GatewayConfig,
    session: ContainerSession,
}

impl Gateway {
    /// Create a gateway with the default configuration
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_config(store, GatewayConfig::default())
    }

    pub fn with_config(store: Arc<dyn RemoteStore>, config: GatewayConfig) -> Self {
        Self {
            session: ContainerSession::new(store.clone()),
            store,
            config,
        }
    }

    /// Merge options into the current configuration.
    ///
    /// Only mappings are considered; unknown keys and mistyped values are ignored.
    pub fn configure(&mut self, options: &Value) -> &mut Self {
        self.config.merge(GatewayInputConfig::from_value(options));
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Bind to `name`, creating the container if needed and making it public
    /// with the configured TTL
    pub async fn set_container(&mut self, name: &str) -> Result<&ContainerHandle, GatewayError> {
        self.session.bind(name, self.config.ttl).await
    }

    /// The bound container, if any
    pub fn container(&self) -> Option<&ContainerHandle> {
        self.session.container()
    }

    /// Account usage and the bound container
    pub async fn info(&self) -> Result<GatewayInfo, GatewayError> {
        self.session.info().await
    }

    /// A blob handle for `name` in the bound container. No remote call is made;
    /// a missing container surfaces on the blob's first fetch or save.
    pub fn blob(&self, name: impl Into<String>) -> Blob {
        Blob::new(
            name,
            self.store.clone(),
            self.session.snapshot(),
            self.config.fetch_errors,
        )
    }

    /// One unfetched blob per object in the bound container
    pub async fn blobs(&self) -> Result<Vec<Blob>, GatewayError> {
        let container = self.session.require()?;
        let names = self.store.list_object_names(&container.name).await?;
        Ok(names.into_iter().map(|name| self.blob(name)).collect())
    }

    /// Delete every blob in the bound container, then the container itself.
    ///
    /// `confirmation` must equal [`DELETE_CONFIRMATION`]. Blobs created before
    /// this call still reference the deleted container and must not be reused.
    /// Returns the number of blobs removed.
    pub async fn delete(&mut self, confirmation: &str) -> Result<usize, GatewayError> {
        if confirmation != DELETE_CONFIRMATION {
            return Err(GatewayError::ConfirmationRequired);
        }
        let container = self.session.require()?.name.clone();

        let mut deleted = 0usize;
        let mut failed = Vec::new();
        for mut blob in self.blobs().await? {
            match blob.delete().await {
                Ok(removed) => deleted += usize::from(removed),
                Err(e) if self.config.cascade == CascadePolicy::Continue => {
                    warn!("Failed to delete blob {}/{}: {}", container, blob.name(), e);
                    failed.push(blob.name().to_string());
                }
                Err(e) => return Err(e),
            }
        }

        if !failed.is_empty() {
            return Err(GatewayError::CascadeIncomplete { container, failed });
        }

        self.store.delete_container(&container).await?;
        self.session.unbind();
        info!("Deleted container {} and {} blob(s)", container, deleted);

        Ok(deleted)
    }
}
