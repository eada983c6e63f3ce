//! Blob storage for uploaded recipe images
//!
//! Backends implement [`ImageStorage`]; the service only ever hands them a
//! generated key and the raw bytes.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, primitives::ByteStream};
use std::{env, path::PathBuf, sync::Arc};
use tracing::info;

use crate::error::{StorageError, StorageResult};

/// Which storage backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub media_root: PathBuf,
    /// Bucket for the S3 backend
    pub bucket_name: String,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STORAGE_BACKEND`: `local` or `s3` (default: `local`)
    /// - `MEDIA_ROOT`: directory for the local backend (default: `./media`)
    /// - `MEDIA_BUCKET_NAME`: bucket for the S3 backend (default: `recipe-media`)
    pub fn from_env() -> StorageResult<Self> {
        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            "s3" => StorageBackend::S3,
            other => {
                return Err(StorageError::Configuration(format!(
                    "Unknown storage backend: {}",
                    other
                )));
            }
        };

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());
        let bucket_name =
            env::var("MEDIA_BUCKET_NAME").unwrap_or_else(|_| "recipe-media".to_string());

        Ok(Self {
            backend,
            media_root: PathBuf::from(media_root),
            bucket_name,
        })
    }
}

/// Content store for uploaded images, addressed by generated keys
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store `bytes` under `key`, replacing anything already there
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> StorageResult<()>;

    /// Remove the object under `key`; missing objects are not an error
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Build the backend selected by `config`
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ImageStorage>> {
    match config.backend {
        StorageBackend::Local => {
            info!("Using local image storage at {}", config.media_root.display());
            Ok(Arc::new(LocalStorage::new(config.media_root.clone())))
        }
        StorageBackend::S3 => {
            info!("Using S3 image storage in bucket {}", config.bucket_name);
            let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
            let client = Client::new(&aws_config);
            Ok(Arc::new(S3Storage::new(client, config.bucket_name.clone())))
        }
    }
}

/// Stores images below a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem location of `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ImageStorage for LocalStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> StorageResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Stores images as objects in an S3 bucket
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket_name: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }
}

#[async_trait]
impl ImageStorage for S3Storage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(bytes));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        Ok(())
    }
}
