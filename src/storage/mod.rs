//! Generic storage collaborator.
//!
//! [`ObjectStorage`] exposes the upload/download/copy/delete primitives the
//! orchestrator needs to route audio to destinations that are not the chosen
//! provider's own storage, and to read source text. [`CloudStorage`] backs it
//! with `object_store` for S3 and GCS and with `tokio::fs` for local paths.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{Error as ObjectStoreError, ObjectStore, PutPayload};
use tracing::{debug, error};

use crate::config::T2SConfig;
use crate::core::error::{T2SError, T2SResult};

mod url;

pub use self::url::{StorageLocation, is_aws_url, is_cloud_url, is_google_url};

// =============================================================================
// Storage Trait
// =============================================================================

/// Storage primitives over any [`StorageLocation`].
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, location: &StorageLocation, data: Bytes) -> T2SResult<()>;

    async fn download(&self, location: &StorageLocation) -> T2SResult<Bytes>;

    /// Copy an object. The default reads the whole object and writes it back.
    async fn copy(&self, from: &StorageLocation, to: &StorageLocation) -> T2SResult<()> {
        let data = self.download(from).await?;
        self.upload(to, data).await
    }

    async fn delete(&self, location: &StorageLocation) -> T2SResult<()>;
}

// =============================================================================
// Credentials and Store Construction
// =============================================================================

/// Credentials used to open cloud object stores.
#[derive(Clone, Default)]
pub struct StorageCredentials {
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub google_service_account_path: Option<String>,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("aws_access_key_id", &self.aws_access_key_id.as_ref().map(|_| "***"))
            .field("aws_secret_access_key", &self.aws_secret_access_key.as_ref().map(|_| "***"))
            .field("aws_session_token", &self.aws_session_token.as_ref().map(|_| "***"))
            .field("google_service_account_path", &self.google_service_account_path)
            .finish()
    }
}

impl Drop for StorageCredentials {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.aws_access_key_id {
            key.zeroize();
        }
        if let Some(ref mut secret) = self.aws_secret_access_key {
            secret.zeroize();
        }
        if let Some(ref mut token) = self.aws_session_token {
            token.zeroize();
        }
    }
}

impl StorageCredentials {
    pub fn from_config(config: &T2SConfig) -> Self {
        Self {
            aws_access_key_id: config.aws_access_key_id.clone(),
            aws_secret_access_key: config.aws_secret_access_key.clone(),
            aws_session_token: config.aws_session_token.clone(),
            google_service_account_path: config.google_credentials.clone(),
        }
    }
}

/// Open an S3 bucket. Falls back to the standard `AWS_*` environment when no
/// explicit keys are configured.
pub fn s3_store(
    bucket: &str,
    region: &str,
    credentials: &StorageCredentials,
) -> T2SResult<Arc<dyn ObjectStore>> {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_region(region);

    if let (Some(key), Some(secret)) = (
        &credentials.aws_access_key_id,
        &credentials.aws_secret_access_key,
    ) {
        builder = builder
            .with_access_key_id(key)
            .with_secret_access_key(secret);
        if let Some(token) = &credentials.aws_session_token {
            builder = builder.with_token(token);
        }
    }

    let store = builder.build().map_err(|e| {
        T2SError::Configuration(format!("Failed to open S3 bucket '{bucket}': {e}"))
    })?;
    Ok(Arc::new(store))
}

/// Open a GCS bucket using a service-account file or the ambient environment.
pub fn gcs_store(
    bucket: &str,
    credentials: &StorageCredentials,
) -> T2SResult<Arc<dyn ObjectStore>> {
    let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
    if let Some(path) = &credentials.google_service_account_path {
        builder = builder.with_service_account_path(path);
    }

    let store = builder.build().map_err(|e| {
        T2SError::Configuration(format!("Failed to open GCS bucket '{bucket}': {e}"))
    })?;
    Ok(Arc::new(store))
}

/// Put bytes to `key` in an already opened store.
pub async fn put_object(store: &dyn ObjectStore, key: &str, data: Bytes) -> T2SResult<()> {
    let len = data.len();
    store
        .put(&ObjectPath::from(key), PutPayload::from(data))
        .await
        .map_err(|e| {
            error!(key = %key, error = %e, "Object upload failed");
            T2SError::Upload(format!("Failed to upload '{key}': {e}"))
        })?;
    debug!(key = %key, bytes = len, "Uploaded object");
    Ok(())
}

// =============================================================================
// Cloud Storage
// =============================================================================

/// `object_store` backed implementation of [`ObjectStorage`].
#[derive(Debug, Clone, Default)]
pub struct CloudStorage {
    credentials: StorageCredentials,
}

impl CloudStorage {
    pub fn new(credentials: StorageCredentials) -> Self {
        Self { credentials }
    }

    pub fn from_config(config: &T2SConfig) -> Self {
        Self::new(StorageCredentials::from_config(config))
    }

    fn open(&self, location: &StorageLocation) -> T2SResult<(Arc<dyn ObjectStore>, ObjectPath)> {
        match location {
            StorageLocation::Aws {
                bucket,
                key,
                region,
            } => Ok((
                s3_store(bucket, region, &self.credentials)?,
                ObjectPath::from(key.as_str()),
            )),
            StorageLocation::Google { bucket, key } => Ok((
                gcs_store(bucket, &self.credentials)?,
                ObjectPath::from(key.as_str()),
            )),
            StorageLocation::Local(path) => Err(T2SError::Configuration(format!(
                "{} is a local path, not an object store location",
                path.display()
            ))),
        }
    }

    fn same_bucket(from: &StorageLocation, to: &StorageLocation) -> bool {
        match (from, to) {
            (
                StorageLocation::Aws {
                    bucket: a,
                    region: ra,
                    ..
                },
                StorageLocation::Aws {
                    bucket: b,
                    region: rb,
                    ..
                },
            ) => a == b && ra == rb,
            (StorageLocation::Google { bucket: a, .. }, StorageLocation::Google { bucket: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

#[async_trait]
impl ObjectStorage for CloudStorage {
    async fn upload(&self, location: &StorageLocation, data: Bytes) -> T2SResult<()> {
        if let StorageLocation::Local(path) = location {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    T2SError::Upload(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
            tokio::fs::write(path, &data).await.map_err(|e| {
                T2SError::Upload(format!("Failed to write {}: {e}", path.display()))
            })?;
            debug!(path = %path.display(), bytes = data.len(), "Wrote local file");
            return Ok(());
        }

        let (store, object_path) = self.open(location)?;
        put_object(store.as_ref(), object_path.as_ref(), data).await
    }

    async fn download(&self, location: &StorageLocation) -> T2SResult<Bytes> {
        if let StorageLocation::Local(path) = location {
            let data = tokio::fs::read(path).await.map_err(|e| {
                T2SError::Download(format!("Failed to read {}: {e}", path.display()))
            })?;
            return Ok(Bytes::from(data));
        }

        let (store, object_path) = self.open(location)?;
        let result = store.get(&object_path).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => {
                T2SError::Download(format!("Object not found: {location}"))
            }
            other => {
                error!(location = %location, error = %other, "Object download failed");
                T2SError::Download(format!("Failed to download {location}: {other}"))
            }
        })?;
        result
            .bytes()
            .await
            .map_err(|e| T2SError::Download(format!("Failed to read {location}: {e}")))
    }

    async fn copy(&self, from: &StorageLocation, to: &StorageLocation) -> T2SResult<()> {
        if Self::same_bucket(from, to) {
            let (store, from_path) = self.open(from)?;
            let to_path = ObjectPath::from(to.key().as_str());
            return store.copy(&from_path, &to_path).await.map_err(|e| {
                T2SError::Upload(format!("Failed to copy {from} to {to}: {e}"))
            });
        }

        let data = self.download(from).await?;
        self.upload(to, data).await
    }

    async fn delete(&self, location: &StorageLocation) -> T2SResult<()> {
        if let StorageLocation::Local(path) = location {
            return tokio::fs::remove_file(path).await.map_err(|e| {
                T2SError::Upload(format!("Failed to delete {}: {e}", path.display()))
            });
        }

        let (store, object_path) = self.open(location)?;
        store
            .delete(&object_path)
            .await
            .map_err(|e| T2SError::Upload(format!("Failed to delete {location}: {e}")))
    }
}
