use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::auth::SessionCredentials;
use crate::error::AppError;

pub const DEFAULT_ACCESS_LEVEL: &str = "public";
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket_url: Url,
    pub access_level: String,
    /// Issue a HEAD request before handing out a URL.
    pub verify_keys: bool,
}

impl StorageConfig {
    pub fn new(bucket_url: &str) -> Result<Self, AppError> {
        let bucket_url = Url::parse(bucket_url)
            .map_err(|e| AppError::Config(format!("Invalid storage URL {}: {}", bucket_url, e)))?;
        if bucket_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("Storage URL {} cannot be a base", bucket_url)));
        }
        Ok(Self {
            bucket_url,
            access_level: DEFAULT_ACCESS_LEVEL.to_string(),
            verify_keys: false,
        })
    }

    /// Returns `Ok(None)` when no bucket is configured.
    pub fn new_from_env() -> Result<Option<Self>, AppError> {
        let Ok(raw_url) = env::var("TODO_STORAGE_URL") else {
            return Ok(None);
        };
        let mut config = Self::new(&raw_url)?;

        if let Ok(level) = env::var("TODO_STORAGE_ACCESS_LEVEL") {
            if !level.is_empty() {
                config.access_level = level;
            }
        }
        config.verify_keys = env::var("TODO_STORAGE_VERIFY_KEYS")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Some(config))
    }
}

/// Key/value object storage holding todo images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Resolves a storage key to a URL a browser can display.
    async fn get_url(&self, key: &str) -> Result<String, AppError>;
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Result<(), AppError>;
}

pub struct HttpBlobStore {
    client: Client,
    config: StorageConfig,
    credentials: SessionCredentials,
}

impl HttpBlobStore {
    pub fn new(config: StorageConfig, credentials: SessionCredentials) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config, credentials })
    }

    /// `<bucket>/<access level>/<key>`, with the key kept as one path segment.
    pub fn object_url(&self, key: &str) -> Result<Url, AppError> {
        if key.is_empty() {
            return Err(AppError::BadRequest("storage key is empty".to_string()));
        }

        let mut url = self.config.bucket_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Storage URL {} cannot be a base", self.config.bucket_url)))?
            .pop_if_empty()
            .push(&self.config.access_level)
            .push(key);
        Ok(url)
    }

    /// Attaches the current session's ID token, if anyone is signed in.
    async fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.id_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn get_url(&self, key: &str) -> Result<String, AppError> {
        let url = self.object_url(key)?;

        if self.config.verify_keys {
            let response = self.authorize(self.client.head(url.clone())).await.send().await?;
            match response.status() {
                StatusCode::NOT_FOUND => return Err(AppError::NotFound(format!("storage key {}", key))),
                status if !status.is_success() => {
                    return Err(AppError::Remote(format!("Blob store returned {} for {}", status, key)));
                }
                _ => {}
            }
        }

        Ok(url.to_string())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Result<(), AppError> {
        let url = self.object_url(key)?;
        let size = bytes.len();

        let response = self
            .authorize(self.client.put(url))
            .await
            .header("Content-Type", content_type.unwrap_or(DEFAULT_CONTENT_TYPE))
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!("Failed to store {}: {} {}", key, status, body)));
        }

        debug!("stored {} ({} bytes)", key, size);
        Ok(())
    }
}
