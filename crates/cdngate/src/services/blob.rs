//! Blob: a lazily fetched handle to one remote object
//!
//! A blob starts unfetched. The first touch of any accessor runs
//! [`Blob::fetch`], which confirms the remote object and fills in whatever the
//! caller has not staged locally. Once fetched, further unforced fetches are
//! no-ops, so locally staged contents and content type always win over the
//! remote copy.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use cdngate_store::{RemoteObject, RemoteStore, StoreError, WriteReceipt};
use tracing::{debug, warn};

use super::config::FetchErrorPolicy;
use super::content_type::guess_content_type;
use super::session::ContainerRef;
use crate::error::GatewayError;

/// Result of a remote lookup
#[derive(Debug)]
pub enum FetchOutcome {
    /// The remote object exists and local state is reconciled with it
    Found,
    /// No remote object by that name
    NotFound,
    /// The store failed; the object state could not be confirmed
    TransportError(StoreError),
}

impl FetchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found)
    }

    /// True for both `NotFound` and `TransportError`
    pub fn is_absent(&self) -> bool {
        !self.is_found()
    }
}

/// Handle to one named object in a container
pub struct Blob {
    store: Arc<dyn RemoteStore>,
    container: Option<ContainerRef>,
    fetch_errors: FetchErrorPolicy,
    remote_object: Option<RemoteObject>,
    fetched: bool,
    exists: Option<bool>,
    name: String,
    contents: Option<Bytes>,
    content_type: Option<String>,
    uri: Option<String>,
    secure_uri: Option<String>,
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("name", &self.name)
            .field("container", &self.container.as_ref().map(|c| &c.name))
            .field("fetched", &self.fetched)
            .field("exists", &self.exists)
            .field("content_type", &self.content_type)
            .field("size", &self.contents.as_ref().map(Bytes::len))
            .field("uri", &self.uri)
            .finish()
    }
}

impl Blob {
    /// Create an unfetched blob. No remote call is made.
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn RemoteStore>,
        container: Option<ContainerRef>,
        fetch_errors: FetchErrorPolicy,
    ) -> Self {
        Self {
            store,
            container,
            fetch_errors,
            remote_object: None,
            fetched: false,
            exists: None,
            name: name.into(),
            contents: None,
            content_type: None,
            uri: None,
            secure_uri: None,
        }
    }

    /// Blob name. Does not fetch.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a fetch has succeeded. Does not fetch.
    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    /// Last known remote existence; `None` until confirmed. Does not fetch.
    pub fn exists_state(&self) -> Option<bool> {
        self.exists
    }

    /// Contents, local or fetched. Triggers `fetch(false)` first.
    pub async fn contents(&mut self) -> Result<Option<&Bytes>, GatewayError> {
        self.fetch(false).await?;
        Ok(self.contents.as_ref())
    }

    /// Content type, local or fetched. Triggers `fetch(false)` first.
    pub async fn content_type(&mut self) -> Result<Option<&str>, GatewayError> {
        self.fetch(false).await?;
        Ok(self.content_type.as_deref())
    }

    /// Public URI, known after a successful fetch or save. Triggers `fetch(false)` first.
    pub async fn uri(&mut self) -> Result<Option<&str>, GatewayError> {
        self.fetch(false).await?;
        Ok(self.uri.as_deref())
    }

    /// Secure URI, known after a successful fetch or save. Triggers `fetch(false)` first.
    pub async fn secure_uri(&mut self) -> Result<Option<&str>, GatewayError> {
        self.fetch(false).await?;
        Ok(self.secure_uri.as_deref())
    }

    /// Stage new contents for the next save.
    ///
    /// Triggers `fetch(false)` first, so staging contents for a brand-new
    /// object still costs one lookup.
    pub async fn set_contents(
        &mut self,
        contents: impl Into<Bytes>,
    ) -> Result<&mut Self, GatewayError> {
        self.fetch(false).await?;
        self.contents = Some(contents.into());
        Ok(self)
    }

    /// Stage a content type for the next save. Triggers `fetch(false)` first.
    pub async fn set_content_type(
        &mut self,
        content_type: impl Into<String>,
    ) -> Result<&mut Self, GatewayError> {
        self.fetch(false).await?;
        self.content_type = Some(content_type.into());
        Ok(self)
    }

    /// Look the object up remotely and reconcile local state.
    ///
    /// Without `force` this is a no-op once a fetch has succeeded, reporting
    /// the last known state (`NotFound` after a delete). A found
    /// object only fills contents and content type that are not set locally.
    /// A missing object leaves the blob untouched, so the lookup may be
    /// retried.
    pub async fn fetch(&mut self, force: bool) -> Result<FetchOutcome, GatewayError> {
        if self.fetched && !force {
            return Ok(match self.exists {
                Some(true) => FetchOutcome::Found,
                _ => FetchOutcome::NotFound,
            });
        }

        if self.name.is_empty() {
            return Err(GatewayError::MissingBlobName);
        }

        let container = self
            .container
            .clone()
            .ok_or(GatewayError::NoContainerBound)?;

        debug!("Fetching {}/{} (force: {})", container.name, self.name, force);

        let object = match self.store.get_object(&container.name, &self.name).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                debug!("{}/{} does not exist", container.name, self.name);
                return Ok(FetchOutcome::NotFound);
            }
            Err(e) => return self.fetch_failed(e),
        };

        // Do not override
        if !self.has_contents() {
            match self.store.read_object(&object).await {
                Ok(contents) => self.contents = Some(contents),
                Err(e) => return self.fetch_failed(e),
            }
        }
        if !self.has_content_type() {
            self.content_type = object.content_type.clone();
        }

        self.exists = Some(true);
        self.fetched = true;
        self.remote_object = Some(object);
        self.set_uris(&container);

        Ok(FetchOutcome::Found)
    }

    /// Whether the remote object exists, fetching first if needed.
    ///
    /// Unconfirmed state (not found, or a swallowed transport failure) reads as `false`.
    pub async fn is_exists(&mut self) -> Result<bool, GatewayError> {
        self.fetch(false).await?;
        Ok(self.exists.unwrap_or(false))
    }

    /// Write staged contents to the remote object, creating it if absent.
    ///
    /// Infers the content type from the name when none is staged. Returns
    /// the store's write receipt.
    pub async fn save(&mut self) -> Result<WriteReceipt, GatewayError> {
        if !self.has_contents() {
            return Err(GatewayError::EmptyBlobContent);
        }

        // Set content type if not done yet
        if !self.has_content_type() {
            let guessed = guess_content_type(&self.name)
                .ok_or_else(|| GatewayError::UnrecognizedBlobName(self.name.clone()))?;
            self.content_type = Some(guessed.to_string());
        }

        let contents = self.contents.clone().unwrap_or_default();
        let content_type = self.content_type.clone().unwrap_or_default();

        let exists = self.is_exists().await?;
        let container = self
            .container
            .clone()
            .ok_or(GatewayError::NoContainerBound)?;

        // The handle stays in place until the write succeeds
        let mut object = match self.remote_object.clone().filter(|_| exists) {
            Some(object) => object,
            None => {
                debug!("Creating {}/{}", container.name, self.name);
                self.store.create_object(&container.name, &self.name).await?
            }
        };

        object.content_type = Some(content_type);
        self.set_uris(&container);

        let receipt = self.store.write_object(&object, contents).await?;
        debug!(
            "Saved {}/{} ({} bytes)",
            container.name, self.name, receipt.size
        );

        self.remote_object = Some(object);
        self.exists = Some(true);
        self.fetched = true;

        Ok(receipt)
    }

    /// Delete the remote object.
    ///
    /// Returns `false` without a remote call when the object does not exist.
    pub async fn delete(&mut self) -> Result<bool, GatewayError> {
        if !self.is_exists().await? {
            return Ok(false);
        }

        let container = self
            .container
            .clone()
            .ok_or(GatewayError::NoContainerBound)?;
        self.store.delete_object(&container.name, &self.name).await?;
        debug!("Deleted {}/{}", container.name, self.name);

        self.exists = Some(false);
        self.remote_object = None;
        Ok(true)
    }

    fn has_contents(&self) -> bool {
        self.contents.as_ref().is_some_and(|c| !c.is_empty())
    }

    fn has_content_type(&self) -> bool {
        self.content_type.as_ref().is_some_and(|t| !t.is_empty())
    }

    fn set_uris(&mut self, container: &ContainerRef) {
        let (uri, secure_uri) = container.uris_for(&self.name);
        self.uri = uri;
        self.secure_uri = secure_uri;
    }

    fn fetch_failed(&self, err: StoreError) -> Result<FetchOutcome, GatewayError> {
        match self.fetch_errors {
            FetchErrorPolicy::Swallow => {
                warn!("Could not fetch blob {}: {}", self.name, err);
                Ok(FetchOutcome::TransportError(err))
            }
            FetchErrorPolicy::Surface => Err(err.into()),
        }
    }
}
