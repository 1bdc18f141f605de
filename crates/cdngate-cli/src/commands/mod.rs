pub mod blob;
pub mod container;

pub use blob::BlobCommand;
pub use container::ContainerCommand;

use std::sync::Arc;

use anyhow::Context;
use cdngate::{Gateway, DEFAULT_TTL};
use cdngate_store::{S3Store, S3StoreConfig};
use clap::Args;
use serde_json::json;
use tracing::debug;

/// Container delete policy when a blob fails to delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CascadeArg {
    /// Stop at the first failure and keep the container
    #[default]
    Abort,
    /// Try every blob, then report the failures
    Continue,
}

impl std::fmt::Display for CascadeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CascadeArg::Abort => write!(f, "abort"),
            CascadeArg::Continue => write!(f, "continue"),
        }
    }
}

/// Connection settings shared by every command
#[derive(Args)]
pub struct StoreArgs {
    /// S3 access key ID
    #[arg(long, env = "S3_ACCESS_KEY_ID")]
    pub access_key_id: String,

    /// S3 secret access key
    #[arg(long, env = "S3_SECRET_ACCESS_KEY")]
    pub secret_access_key: String,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    pub region: String,

    /// S3 endpoint URL (for MinIO/custom S3)
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Force path style (needed for MinIO)
    #[arg(long, env = "S3_FORCE_PATH_STYLE")]
    pub force_path_style: bool,

    /// Container (bucket) to bind; created and made public if needed
    #[arg(long, env = "CDNGATE_CONTAINER")]
    pub container: String,

    /// CDN time-to-live in seconds applied when binding the container
    #[arg(long, env = "CDNGATE_TTL", default_value_t = DEFAULT_TTL)]
    pub ttl: u64,

    /// Container delete policy when a blob fails
    #[arg(long, env = "CDNGATE_CASCADE", value_enum, default_value_t = CascadeArg::Abort)]
    pub cascade: CascadeArg,

    /// Public CDN base URL (defaults to the endpoint or S3 website URL)
    #[arg(long, env = "CDNGATE_CDN_URL")]
    pub cdn_url: Option<String>,

    /// Secure CDN base URL
    #[arg(long, env = "CDNGATE_CDN_SSL_URL")]
    pub cdn_ssl_url: Option<String>,
}

impl StoreArgs {
    fn store_config(&self) -> S3StoreConfig {
        S3StoreConfig {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            force_path_style: self.force_path_style,
            cdn_base_url: self.cdn_url.clone(),
            cdn_ssl_base_url: self.cdn_ssl_url.clone(),
            default_ttl: Some(self.ttl),
        }
    }

    /// Build the S3 store and a gateway bound to the configured container
    pub async fn connect(&self) -> anyhow::Result<Gateway> {
        let store = S3Store::new(self.store_config())
            .await
            .context("Failed to create S3 store")?;

        let mut gateway = Gateway::new(Arc::new(store));
        gateway.configure(&json!({
            "ttl": self.ttl,
            "cascade": self.cascade.to_string(),
        }));
        debug!("Gateway configuration: {:?}", gateway.config());

        gateway
            .set_container(&self.container)
            .await
            .with_context(|| format!("Failed to bind container '{}'", self.container))?;

        Ok(gateway)
    }
}
