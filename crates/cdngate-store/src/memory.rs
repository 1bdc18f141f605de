//! In-process remote store
//!
//! Holds containers and objects in memory, records every call it receives and
//! can be told to fail specific operations. Used by tests and local runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::StoreError;
use crate::store::RemoteStore;
use crate::types::{AccountInfo, ContainerHandle, RemoteObject, WriteReceipt};

/// Default public CDN base used by [`InMemoryStore::new`]
pub const DEFAULT_CDN_BASE: &str = "http://cdn.local";
/// Default secure CDN base used by [`InMemoryStore::new`]
pub const DEFAULT_CDN_SSL_BASE: &str = "https://cdn.local";

/// Operation kinds, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetContainer,
    CreateContainer,
    MakePublic,
    ListObjectNames,
    DeleteContainer,
    AccountInfo,
    GetObject,
    CreateObject,
    ReadObject,
    WriteObject,
    DeleteObject,
}

/// A call received by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetContainer(String),
    CreateContainer(String),
    MakePublic { container: String, ttl: u64 },
    ListObjectNames(String),
    DeleteContainer(String),
    AccountInfo,
    GetObject { container: String, name: String },
    CreateObject { container: String, name: String },
    ReadObject { container: String, name: String },
    WriteObject {
        container: String,
        name: String,
        content_type: Option<String>,
    },
    DeleteObject { container: String, name: String },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::GetContainer(_) => StoreOp::GetContainer,
            StoreCall::CreateContainer(_) => StoreOp::CreateContainer,
            StoreCall::MakePublic { .. } => StoreOp::MakePublic,
            StoreCall::ListObjectNames(_) => StoreOp::ListObjectNames,
            StoreCall::DeleteContainer(_) => StoreOp::DeleteContainer,
            StoreCall::AccountInfo => StoreOp::AccountInfo,
            StoreCall::GetObject { .. } => StoreOp::GetObject,
            StoreCall::CreateObject { .. } => StoreOp::CreateObject,
            StoreCall::ReadObject { .. } => StoreOp::ReadObject,
            StoreCall::WriteObject { .. } => StoreOp::WriteObject,
            StoreCall::DeleteObject { .. } => StoreOp::DeleteObject,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    contents: Bytes,
    content_type: Option<String>,
}

#[derive(Debug, Default)]
struct StoredContainer {
    public: bool,
    ttl: Option<u64>,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Clone)]
struct Failure {
    op: StoreOp,
    /// Object or container name the failure is limited to
    target: Option<String>,
}

/// In-memory [`RemoteStore`]
pub struct InMemoryStore {
    cdn_base: String,
    cdn_ssl_base: String,
    containers: RwLock<BTreeMap<String, StoredContainer>>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<Vec<Failure>>,
}

impl InMemoryStore {
    /// Create an empty store serving from [`DEFAULT_CDN_BASE`]
    pub fn new() -> Self {
        Self::with_cdn_bases(DEFAULT_CDN_BASE, DEFAULT_CDN_SSL_BASE)
    }

    /// Create an empty store with custom CDN base URIs
    pub fn with_cdn_bases(cdn_base: impl Into<String>, cdn_ssl_base: impl Into<String>) -> Self {
        Self {
            cdn_base: cdn_base.into(),
            cdn_ssl_base: cdn_ssl_base.into(),
            containers: RwLock::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Seed an object directly, bypassing the call log
    pub async fn insert_object(
        &self,
        container: &str,
        name: &str,
        contents: impl Into<Bytes>,
        content_type: Option<&str>,
    ) {
        let mut containers = self.containers.write().await;
        containers.entry(container.to_string()).or_default().objects.insert(
            name.to_string(),
            StoredObject {
                contents: contents.into(),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    /// Contents and content type of a stored object
    pub async fn object(&self, container: &str, name: &str) -> Option<(Bytes, Option<String>)> {
        let containers = self.containers.read().await;
        containers
            .get(container)
            .and_then(|c| c.objects.get(name))
            .map(|o| (o.contents.clone(), o.content_type.clone()))
    }

    pub async fn has_container(&self, name: &str) -> bool {
        self.containers.read().await.contains_key(name)
    }

    /// Every call received so far, oldest first
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    /// Number of calls received for one operation kind
    pub async fn count(&self, op: StoreOp) -> usize {
        self.calls.lock().await.iter().filter(|c| c.op() == op).count()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Make every call of `op` fail with a transport error.
    ///
    /// With a `target`, only calls on that object (or container, for container
    /// operations) fail.
    pub async fn fail_on(&self, op: StoreOp, target: Option<&str>) {
        self.failures.lock().await.push(Failure {
            op,
            target: target.map(str::to_string),
        });
    }

    pub async fn clear_failures(&self) {
        self.failures.lock().await.clear();
    }

    async fn record(&self, call: StoreCall) {
        self.calls.lock().await.push(call);
    }

    async fn check(&self, op: StoreOp, target: &str) -> Result<(), StoreError> {
        let failures = self.failures.lock().await;
        let injected = failures
            .iter()
            .any(|f| f.op == op && f.target.as_deref().map_or(true, |t| t == target));
        if injected {
            return Err(StoreError::Transport(format!(
                "injected failure for {:?} on '{}'",
                op, target
            )));
        }
        Ok(())
    }

    fn handle(&self, name: &str, container: &StoredContainer) -> ContainerHandle {
        if !container.public {
            return ContainerHandle::private(name);
        }
        ContainerHandle {
            name: name.to_string(),
            public: true,
            ttl: container.ttl,
            cdn_uri: Some(format!("{}/{}", self.cdn_base, name)),
            cdn_ssl_uri: Some(format!("{}/{}", self.cdn_ssl_base, name)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn etag(contents: &[u8]) -> String {
    let digest = Sha256::digest(contents);
    hex::encode(&digest[..16])
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn get_container(&self, name: &str) -> Result<ContainerHandle, StoreError> {
        self.record(StoreCall::GetContainer(name.to_string())).await;
        self.check(StoreOp::GetContainer, name).await?;

        let containers = self.containers.read().await;
        containers
            .get(name)
            .map(|c| self.handle(name, c))
            .ok_or_else(|| StoreError::ContainerNotFound(name.to_string()))
    }

    async fn create_container(&self, name: &str) -> Result<ContainerHandle, StoreError> {
        self.record(StoreCall::CreateContainer(name.to_string())).await;
        self.check(StoreOp::CreateContainer, name).await?;

        let mut containers = self.containers.write().await;
        let container = containers.entry(name.to_string()).or_default();
        debug!("Created in-memory container {}", name);
        Ok(self.handle(name, container))
    }

    async fn make_public(
        &self,
        container: &ContainerHandle,
        ttl: u64,
    ) -> Result<ContainerHandle, StoreError> {
        self.record(StoreCall::MakePublic {
            container: container.name.clone(),
            ttl,
        })
        .await;
        self.check(StoreOp::MakePublic, &container.name).await?;

        let mut containers = self.containers.write().await;
        let stored = containers
            .get_mut(&container.name)
            .ok_or_else(|| StoreError::ContainerNotFound(container.name.clone()))?;
        stored.public = true;
        stored.ttl = Some(ttl);
        Ok(self.handle(&container.name, stored))
    }

    async fn list_object_names(&self, container: &str) -> Result<Vec<String>, StoreError> {
        self.record(StoreCall::ListObjectNames(container.to_string()))
            .await;
        self.check(StoreOp::ListObjectNames, container).await?;

        let containers = self.containers.read().await;
        containers
            .get(container)
            .map(|c| c.objects.keys().cloned().collect())
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))
    }

    async fn delete_container(&self, name: &str) -> Result<(), StoreError> {
        self.record(StoreCall::DeleteContainer(name.to_string())).await;
        self.check(StoreOp::DeleteContainer, name).await?;

        let mut containers = self.containers.write().await;
        match containers.get(name) {
            None => Err(StoreError::ContainerNotFound(name.to_string())),
            Some(c) if !c.objects.is_empty() => Err(StoreError::Conflict(format!(
                "container '{}' still holds {} object(s)",
                name,
                c.objects.len()
            ))),
            Some(_) => {
                containers.remove(name);
                debug!("Deleted in-memory container {}", name);
                Ok(())
            }
        }
    }

    async fn account_info(&self) -> Result<AccountInfo, StoreError> {
        self.record(StoreCall::AccountInfo).await;
        self.check(StoreOp::AccountInfo, "").await?;

        let containers = self.containers.read().await;
        let total_bytes = containers
            .values()
            .flat_map(|c| c.objects.values())
            .map(|o| o.contents.len() as u64)
            .sum();
        Ok(AccountInfo {
            total_containers: containers.len() as u64,
            total_bytes,
        })
    }

    async fn get_object(&self, container: &str, name: &str) -> Result<RemoteObject, StoreError> {
        self.record(StoreCall::GetObject {
            container: container.to_string(),
            name: name.to_string(),
        })
        .await;
        self.check(StoreOp::GetObject, name).await?;

        let containers = self.containers.read().await;
        let stored = containers
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?
            .objects
            .get(name)
            .ok_or_else(|| StoreError::object_not_found(container, name))?;
        Ok(RemoteObject {
            container: container.to_string(),
            name: name.to_string(),
            content_type: stored.content_type.clone(),
            size: Some(stored.contents.len() as u64),
        })
    }

    async fn create_object(
        &self,
        container: &str,
        name: &str,
    ) -> Result<RemoteObject, StoreError> {
        self.record(StoreCall::CreateObject {
            container: container.to_string(),
            name: name.to_string(),
        })
        .await;
        self.check(StoreOp::CreateObject, name).await?;

        if !self.containers.read().await.contains_key(container) {
            return Err(StoreError::ContainerNotFound(container.to_string()));
        }
        Ok(RemoteObject::new(container, name))
    }

    async fn read_object(&self, object: &RemoteObject) -> Result<Bytes, StoreError> {
        self.record(StoreCall::ReadObject {
            container: object.container.clone(),
            name: object.name.clone(),
        })
        .await;
        self.check(StoreOp::ReadObject, &object.name).await?;

        self.object(&object.container, &object.name)
            .await
            .map(|(contents, _)| contents)
            .ok_or_else(|| StoreError::object_not_found(&object.container, &object.name))
    }

    async fn write_object(
        &self,
        object: &RemoteObject,
        contents: Bytes,
    ) -> Result<WriteReceipt, StoreError> {
        self.record(StoreCall::WriteObject {
            container: object.container.clone(),
            name: object.name.clone(),
            content_type: object.content_type.clone(),
        })
        .await;
        self.check(StoreOp::WriteObject, &object.name).await?;

        let mut containers = self.containers.write().await;
        let stored = containers
            .get_mut(&object.container)
            .ok_or_else(|| StoreError::ContainerNotFound(object.container.clone()))?;
        let receipt = WriteReceipt {
            name: object.name.clone(),
            etag: Some(etag(&contents)),
            size: contents.len() as u64,
        };
        stored.objects.insert(
            object.name.clone(),
            StoredObject {
                contents,
                content_type: object.content_type.clone(),
            },
        );
        debug!(
            "Wrote {} bytes to {}/{}",
            receipt.size, object.container, object.name
        );
        Ok(receipt)
    }

    async fn delete_object(&self, container: &str, name: &str) -> Result<(), StoreError> {
        self.record(StoreCall::DeleteObject {
            container: container.to_string(),
            name: name.to_string(),
        })
        .await;
        self.check(StoreOp::DeleteObject, name).await?;

        let mut containers = self.containers.write().await;
        containers
            .get_mut(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?
            .objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::object_not_found(container, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_container_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.get_container("assets").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_make_public_sets_cdn_uris() {
        let store = InMemoryStore::new();
        let handle = store.create_container("assets").await.unwrap();
        assert!(!handle.public);
        assert!(handle.cdn_uri.is_none());

        let handle = store.make_public(&handle, 3600).await.unwrap();
        assert!(handle.public);
        assert_eq!(handle.ttl, Some(3600));
        assert_eq!(handle.cdn_uri.as_deref(), Some("http://cdn.local/assets"));
        assert_eq!(handle.cdn_ssl_uri.as_deref(), Some("https://cdn.local/assets"));
    }

    #[tokio::test]
    async fn test_created_object_is_absent_until_written() {
        let store = InMemoryStore::new();
        store.create_container("assets").await.unwrap();

        let mut object = store.create_object("assets", "app.js").await.unwrap();
        assert!(store.get_object("assets", "app.js").await.unwrap_err().is_not_found());

        object.content_type = Some("application/javascript".to_string());
        let receipt = store
            .write_object(&object, Bytes::from_static(b"console.log(1)"))
            .await
            .unwrap();
        assert_eq!(receipt.size, 14);
        assert!(receipt.etag.is_some());

        let fetched = store.get_object("assets", "app.js").await.unwrap();
        assert_eq!(fetched.content_type.as_deref(), Some("application/javascript"));
        assert_eq!(fetched.size, Some(14));
        let contents = store.read_object(&fetched).await.unwrap();
        assert_eq!(&contents[..], b"console.log(1)");
    }

    #[tokio::test]
    async fn test_delete_container_requires_empty() {
        let store = InMemoryStore::new();
        store.insert_object("assets", "a.png", "png", None).await;

        let err = store.delete_container("assets").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.delete_object("assets", "a.png").await.unwrap();
        store.delete_container("assets").await.unwrap();
        assert!(!store.has_container("assets").await);
    }

    #[tokio::test]
    async fn test_account_info_sums_all_containers() {
        let store = InMemoryStore::new();
        store.insert_object("assets", "a.css", "body{}", None).await;
        store.insert_object("media", "b.png", vec![0u8; 10], None).await;

        let info = store.account_info().await.unwrap();
        assert_eq!(info.total_containers, 2);
        assert_eq!(info.total_bytes, 16);
    }

    #[tokio::test]
    async fn test_injected_failure_limited_to_target() {
        let store = InMemoryStore::new();
        store.insert_object("assets", "a.png", "a", None).await;
        store.insert_object("assets", "b.png", "b", None).await;
        store.fail_on(StoreOp::DeleteObject, Some("a.png")).await;

        let err = store.delete_object("assets", "a.png").await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        store.delete_object("assets", "b.png").await.unwrap();

        store.clear_failures().await;
        store.delete_object("assets", "a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let store = InMemoryStore::new();
        let _ = store.get_container("assets").await;
        store.create_container("assets").await.unwrap();

        assert_eq!(
            store.calls().await,
            vec![
                StoreCall::GetContainer("assets".to_string()),
                StoreCall::CreateContainer("assets".to_string()),
            ]
        );
        assert_eq!(store.count(StoreOp::GetContainer).await, 1);
    }
}
