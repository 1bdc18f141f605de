//! cdngate-store: Remote object store seam for the CDN gateway
//!
//! Defines the [`RemoteStore`] trait the gateway consumes, plus two backends:
//! an in-process [`InMemoryStore`] and an S3/MinIO backed [`S3Store`].

pub mod error;
pub mod memory;
pub mod s3;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use memory::{InMemoryStore, StoreCall, StoreOp};
pub use s3::{S3Store, S3StoreConfig};
pub use store::RemoteStore;
pub use types::{AccountInfo, ContainerHandle, RemoteObject, WriteReceipt};
