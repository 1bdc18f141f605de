//! The remote store trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::types::{AccountInfo, ContainerHandle, RemoteObject, WriteReceipt};

/// Object store operations consumed by the gateway
///
/// Lookups of absent containers or objects must fail with an error for which
/// [`StoreError::is_not_found`] returns true.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Look up an existing container
    async fn get_container(&self, name: &str) -> Result<ContainerHandle, StoreError>;

    /// Create a container
    async fn create_container(&self, name: &str) -> Result<ContainerHandle, StoreError>;

    /// Mark a container publicly servable with the given TTL and return its refreshed handle
    async fn make_public(
        &self,
        container: &ContainerHandle,
        ttl: u64,
    ) -> Result<ContainerHandle, StoreError>;

    /// Names of every object in a container
    async fn list_object_names(&self, container: &str) -> Result<Vec<String>, StoreError>;

    /// Delete a container
    async fn delete_container(&self, name: &str) -> Result<(), StoreError>;

    /// Account-level usage
    async fn account_info(&self) -> Result<AccountInfo, StoreError>;

    /// Look up an existing object
    async fn get_object(&self, container: &str, name: &str) -> Result<RemoteObject, StoreError>;

    /// Create a handle for a new object; contents land on the first write
    async fn create_object(&self, container: &str, name: &str)
        -> Result<RemoteObject, StoreError>;

    /// Read object contents
    async fn read_object(&self, object: &RemoteObject) -> Result<Bytes, StoreError>;

    /// Write object contents along with its content type
    async fn write_object(
        &self,
        object: &RemoteObject,
        contents: Bytes,
    ) -> Result<WriteReceipt, StoreError>;

    /// Delete an object
    async fn delete_object(&self, container: &str, name: &str) -> Result<(), StoreError>;
}
