//! cdngate: CDN gateway over a remote object store
//!
//! A [`Gateway`] binds to one container of a [`RemoteStore`], keeps it public
//! with a configured TTL and hands out [`Blob`] handles. Blobs fetch their
//! remote state lazily on first touch and never let a fetch overwrite
//! locally staged contents or content type.

pub mod error;
pub mod services;

pub use cdngate_store::{RemoteStore, StoreError};
pub use error::GatewayError;
pub use services::{
    guess_content_type, Blob, CascadePolicy, ContainerRef, ContainerSession, FetchErrorPolicy,
    FetchOutcome, Gateway, GatewayConfig, GatewayInfo, GatewayInputConfig, DEFAULT_TTL,
    DELETE_CONFIRMATION,
};
