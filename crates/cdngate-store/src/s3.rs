//! S3/MinIO implementation of [`RemoteStore`]
//!
//! Containers map to buckets and objects to keys. Making a container public
//! applies a public-read bucket policy; the TTL is remembered per bucket and
//! sent as `Cache-Control` on every later write to that bucket. Buckets this
//! instance never made public fall back to [`S3StoreConfig::default_ttl`].

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Region, SharedCredentialsProvider};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::store::RemoteStore;
use crate::types::{AccountInfo, ContainerHandle, RemoteObject, WriteReceipt};

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an S3-compatible store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StoreConfig {
    /// AWS region (e.g., "us-east-1")
    pub region: String,

    /// Custom endpoint for MinIO/S3-compatible storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Access key ID
    pub access_key_id: String,

    /// Secret access key
    pub secret_access_key: String,

    /// Force path-style addressing (needed for MinIO)
    #[serde(default)]
    pub force_path_style: bool,

    /// Public CDN base URL; the bucket name is appended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_base_url: Option<String>,

    /// Secure CDN base URL; the bucket name is appended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_ssl_base_url: Option<String>,

    /// `Cache-Control` TTL for buckets not made public by this instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ttl: Option<u64>,
}

impl Default for S3StoreConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            force_path_style: false,
            cdn_base_url: None,
            cdn_ssl_base_url: None,
            default_ttl: None,
        }
    }
}

impl S3StoreConfig {
    /// Public and secure base URIs for a bucket
    pub fn cdn_bases(&self, bucket: &str) -> (String, String) {
        let derived = match &self.endpoint {
            Some(endpoint) => {
                let endpoint = endpoint.trim_end_matches('/');
                let secure = match endpoint.strip_prefix("http://") {
                    Some(rest) => format!("https://{}", rest),
                    None => endpoint.to_string(),
                };
                (
                    format!("{}/{}", endpoint, bucket),
                    format!("{}/{}", secure, bucket),
                )
            }
            None => (
                format!("http://{}.s3.{}.amazonaws.com", bucket, self.region),
                format!("https://{}.s3.{}.amazonaws.com", bucket, self.region),
            ),
        };

        let uri = self
            .cdn_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), bucket))
            .unwrap_or(derived.0);
        let ssl_uri = self
            .cdn_ssl_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), bucket))
            .unwrap_or(derived.1);
        (uri, ssl_uri)
    }
}

/// Bucket policy granting anonymous read access to every object
fn public_read_policy(bucket: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicRead",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{}/*", bucket)],
        }]
    })
    .to_string()
}

fn cache_control(ttl: u64) -> String {
    format!("public, max-age={}", ttl)
}

fn transport<E>(operation: &str, target: &str, err: E) -> StoreError
where
    E: std::error::Error,
{
    let message = format!("{} '{}' failed: {}", operation, target, DisplayErrorContext(err));
    error!("{}", message);
    StoreError::Transport(message)
}

/// S3-backed remote store
///
/// S3 has no container-level TTL, so the one passed to `make_public` lives
/// only in this instance. Another process writing to the same bucket sends
/// `config.default_ttl` instead, or no `Cache-Control` header when unset.
pub struct S3Store {
    client: Client,
    config: S3StoreConfig,
    ttls: RwLock<HashMap<String, u64>>,
}

impl S3Store {
    /// Create a new S3 store from connection settings
    pub async fn new(config: S3StoreConfig) -> Result<Self, StoreError> {
        if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
            return Err(StoreError::Config(
                "access key ID and secret access key are required".to_string(),
            ));
        }

        debug!("Creating S3 store for region: {}", config.region);

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "cdngate-store",
        );
        let creds_provider = SharedCredentialsProvider::new(credentials);
        let region_provider = RegionProviderChain::first_try(Region::new(config.region.clone()));

        let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region_provider)
            .credentials_provider(creds_provider);

        // Add custom endpoint if provided (for MinIO)
        if let Some(ep) = &config.endpoint {
            config_builder = config_builder.endpoint_url(ep);
        }

        let sdk_config = config_builder.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style || config.endpoint.is_some())
            .build();

        debug!("S3 client created successfully");

        Ok(Self::from_client(Client::from_conf(s3_config), config))
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client, config: S3StoreConfig) -> Self {
        Self {
            client,
            config,
            ttls: RwLock::new(HashMap::new()),
        }
    }

    /// TTL sent as `Cache-Control` on writes to `bucket`
    async fn cache_ttl(&self, bucket: &str) -> Option<u64> {
        self.ttls
            .read()
            .await
            .get(bucket)
            .copied()
            .or(self.config.default_ttl)
    }

    async fn handle(&self, bucket: &str) -> ContainerHandle {
        let ttl = self.ttls.read().await.get(bucket).copied();
        let (cdn_uri, cdn_ssl_uri) = self.config.cdn_bases(bucket);
        ContainerHandle {
            name: bucket.to_string(),
            public: ttl.is_some(),
            ttl,
            cdn_uri: Some(cdn_uri),
            cdn_ssl_uri: Some(cdn_ssl_uri),
        }
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<(String, u64)>, StoreError> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(cursor.take())
                .send()
                .await
                .map_err(|e| {
                    if e.as_service_error().is_some_and(|se| se.is_no_such_bucket()) {
                        StoreError::ContainerNotFound(bucket.to_string())
                    } else {
                        transport("LIST", bucket, e)
                    }
                })?;

            objects.extend(response.contents().iter().filter_map(|obj| {
                let key = obj.key()?;
                Some((key.to_string(), obj.size().unwrap_or(0).max(0) as u64))
            }));

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    cursor = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!("Found {} objects in bucket '{}'", objects.len(), bucket);
        Ok(objects)
    }
}

#[async_trait]
impl RemoteStore for S3Store {
    async fn get_container(&self, name: &str) -> Result<ContainerHandle, StoreError> {
        debug!("HEAD bucket {}", name);

        self.client
            .head_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    StoreError::ContainerNotFound(name.to_string())
                } else {
                    transport("HEAD bucket", name, e)
                }
            })?;

        Ok(self.handle(name).await)
    }

    async fn create_container(&self, name: &str) -> Result<ContainerHandle, StoreError> {
        info!("Creating bucket {}", name);

        let mut request = self.client.create_bucket().bucket(name);
        if self.config.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.config.region.as_str(),
                    ))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| transport("CREATE bucket", name, e))?;

        Ok(self.handle(name).await)
    }

    async fn make_public(
        &self,
        container: &ContainerHandle,
        ttl: u64,
    ) -> Result<ContainerHandle, StoreError> {
        debug!("PUT policy {} (ttl {}s)", container.name, ttl);

        self.client
            .put_bucket_policy()
            .bucket(&container.name)
            .policy(public_read_policy(&container.name))
            .send()
            .await
            .map_err(|e| transport("PUT bucket policy", &container.name, e))?;

        self.ttls.write().await.insert(container.name.clone(), ttl);
        Ok(self.handle(&container.name).await)
    }

    async fn list_object_names(&self, container: &str) -> Result<Vec<String>, StoreError> {
        debug!("LIST {}", container);
        let objects = self.list_objects(container).await?;
        Ok(objects.into_iter().map(|(key, _)| key).collect())
    }

    async fn delete_container(&self, name: &str) -> Result<(), StoreError> {
        info!("Deleting bucket {}", name);

        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|e| transport("DELETE bucket", name, e))?;

        self.ttls.write().await.remove(name);
        Ok(())
    }

    async fn account_info(&self) -> Result<AccountInfo, StoreError> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| transport("LIST buckets", "*", e))?;

        let mut total_containers = 0u64;
        let mut total_bytes = 0u64;
        for bucket in response.buckets() {
            let Some(name) = bucket.name() else {
                continue;
            };
            total_containers += 1;
            total_bytes += self
                .list_objects(name)
                .await?
                .iter()
                .map(|(_, size)| size)
                .sum::<u64>();
        }

        Ok(AccountInfo {
            total_containers,
            total_bytes,
        })
    }

    async fn get_object(&self, container: &str, name: &str) -> Result<RemoteObject, StoreError> {
        debug!("HEAD {}/{}", container, name);

        let response = self
            .client
            .head_object()
            .bucket(container)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    StoreError::object_not_found(container, name)
                } else {
                    transport("HEAD", name, e)
                }
            })?;

        Ok(RemoteObject {
            container: container.to_string(),
            name: name.to_string(),
            content_type: response.content_type().map(str::to_string),
            size: response.content_length().map(|len| len.max(0) as u64),
        })
    }

    async fn create_object(
        &self,
        container: &str,
        name: &str,
    ) -> Result<RemoteObject, StoreError> {
        // S3 has no empty-object handle; the key materializes on the first PUT
        debug!("NEW {}/{}", container, name);
        Ok(RemoteObject::new(container, name))
    }

    async fn read_object(&self, object: &RemoteObject) -> Result<Bytes, StoreError> {
        debug!("GET {}/{}", object.container, object.name);

        let response = self
            .client
            .get_object()
            .bucket(&object.container)
            .key(&object.name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StoreError::object_not_found(&object.container, &object.name)
                } else {
                    transport("GET", &object.name, e)
                }
            })?;

        let contents = response
            .body
            .collect()
            .await
            .map_err(|e| transport("GET body", &object.name, e))?;
        Ok(contents.into_bytes())
    }

    async fn write_object(
        &self,
        object: &RemoteObject,
        contents: Bytes,
    ) -> Result<WriteReceipt, StoreError> {
        let size = contents.len() as u64;
        let ttl = self.cache_ttl(&object.container).await;

        debug!(
            "PUT {}/{} ({} bytes, {:?})",
            object.container, object.name, size, object.content_type
        );

        let response = self
            .client
            .put_object()
            .bucket(&object.container)
            .key(&object.name)
            .body(ByteStream::from(contents))
            .set_content_type(object.content_type.clone())
            .set_cache_control(ttl.map(cache_control))
            .send()
            .await
            .map_err(|e| transport("PUT", &object.name, e))?;

        Ok(WriteReceipt {
            name: object.name.clone(),
            etag: response.e_tag().map(|tag| tag.trim_matches('"').to_string()),
            size,
        })
    }

    async fn delete_object(&self, container: &str, name: &str) -> Result<(), StoreError> {
        debug!("DELETE {}/{}", container, name);

        self.client
            .delete_object()
            .bucket(container)
            .key(name)
            .send()
            .await
            .map_err(|e| transport("DELETE", name, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::BehaviorVersion;

    fn offline_store(config: S3StoreConfig) -> S3Store {
        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(DEFAULT_REGION))
            .build();
        S3Store::from_client(Client::from_conf(sdk_config), config)
    }

    #[tokio::test]
    async fn test_cache_ttl_without_make_public() {
        let store = offline_store(S3StoreConfig::default());
        assert_eq!(store.cache_ttl("assets").await, None);

        let store = offline_store(S3StoreConfig {
            default_ttl: Some(3600),
            ..Default::default()
        });
        assert_eq!(store.cache_ttl("assets").await, Some(3600));
    }

    #[tokio::test]
    async fn test_cache_ttl_prefers_make_public_value() {
        let store = offline_store(S3StoreConfig {
            default_ttl: Some(3600),
            ..Default::default()
        });
        store.ttls.write().await.insert("assets".to_string(), 900);

        assert_eq!(store.cache_ttl("assets").await, Some(900));
        assert_eq!(store.cache_ttl("other").await, Some(3600));
    }

    #[test]
    fn test_cdn_bases_from_endpoint() {
        let config = S3StoreConfig {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..Default::default()
        };
        let (uri, ssl_uri) = config.cdn_bases("assets");
        assert_eq!(uri, "http://localhost:9000/assets");
        assert_eq!(ssl_uri, "https://localhost:9000/assets");
    }

    #[test]
    fn test_cdn_bases_from_region() {
        let config = S3StoreConfig {
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        let (uri, ssl_uri) = config.cdn_bases("assets");
        assert_eq!(uri, "http://assets.s3.eu-west-1.amazonaws.com");
        assert_eq!(ssl_uri, "https://assets.s3.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_cdn_bases_prefer_explicit_urls() {
        let config = S3StoreConfig {
            endpoint: Some("http://localhost:9000".to_string()),
            cdn_base_url: Some("http://cdn.example.com/".to_string()),
            cdn_ssl_base_url: Some("https://cdn.example.com".to_string()),
            ..Default::default()
        };
        let (uri, ssl_uri) = config.cdn_bases("assets");
        assert_eq!(uri, "http://cdn.example.com/assets");
        assert_eq!(ssl_uri, "https://cdn.example.com/assets");
    }

    #[test]
    fn test_public_read_policy() {
        let policy: serde_json::Value =
            serde_json::from_str(&public_read_policy("assets")).unwrap();
        assert_eq!(policy["Statement"][0]["Effect"], "Allow");
        assert_eq!(policy["Statement"][0]["Principal"], "*");
        assert_eq!(
            policy["Statement"][0]["Resource"][0],
            "arn:aws:s3:::assets/*"
        );
    }

    #[test]
    fn test_cache_control() {
        assert_eq!(cache_control(31557600), "public, max-age=31557600");
    }

    #[tokio::test]
    async fn test_new_requires_credentials() {
        let result = S3Store::new(S3StoreConfig::default()).await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
