//! Storage provider adapters.
//!
//! S3 and GCS buckets are both reached through `object_store`, so a single
//! adapter serves every provider once a client has been built from the
//! caller's credentials. The free functions mirror the request layer: each
//! builds a fresh client, runs one operation and drops it again.

use std::{
    collections::{HashSet, VecDeque},
    io,
    sync::Arc,
};

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use log::{debug, info};
use object_store::{
    ObjectStore, aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, local::LocalFileSystem,
    path::Path,
};

use crate::{
    credentials::{FileInfo, GcsCredentials, ProviderCredentials, S3Credentials},
    error::ProviderError,
    stream::read_bounded,
};

pub const FOLDER_SEPARATOR: char = '/';

/// Operations the sampling pipeline needs from a storage backend.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Lists at most one object to prove the bucket is reachable and readable.
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Every folder in the bucket, each with a trailing `/`. Folders are the
    /// prefixes implied by object keys, so this includes folders that have no
    /// zero-byte marker object of their own.
    async fn list_folders(&self) -> Result<Vec<String>, ProviderError>;

    /// Files directly below `prefix`; nested files and folders are skipped.
    async fn list_files(&self, prefix: &str) -> Result<Vec<FileInfo>, ProviderError>;

    async fn read_text(&self, path: &str, max_size: Option<u64>) -> Result<String, ProviderError>;
}

#[derive(Clone)]
pub struct ObjectStoreAdapter {
    store: Arc<dyn ObjectStore>,
    label: String,
}

impl ObjectStoreAdapter {
    pub fn new(store: Arc<dyn ObjectStore>, label: impl Into<String>) -> Self {
        Self {
            store,
            label: label.into(),
        }
    }

    pub fn from_credentials(
        credentials: &ProviderCredentials,
    ) -> Result<Self, object_store::Error> {
        let store: Arc<dyn ObjectStore> = match credentials {
            ProviderCredentials::S3(s3) => Arc::new(build_s3(s3)?),
            ProviderCredentials::Gcs(gcs) => Arc::new(build_gcs(gcs)?),
        };
        let label = format!("{}://{}", credentials.provider_name(), credentials.bucket());
        Ok(Self::new(store, label))
    }

    /// Serves files below a local directory, used for sampling files on disk.
    pub fn local(root: &std::path::Path) -> Result<Self, object_store::Error> {
        let store = LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store), root.display().to_string()))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn build_s3(credentials: &S3Credentials) -> Result<object_store::aws::AmazonS3, object_store::Error> {
    let mut builder = AmazonS3Builder::new()
        .with_region(&credentials.region)
        .with_bucket_name(&credentials.bucket)
        .with_access_key_id(&credentials.access_key_id)
        .with_secret_access_key(&credentials.secret_access_key);
    if let Some(endpoint) = &credentials.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(endpoint.starts_with("http://"));
    }
    builder.build()
}

fn build_gcs(
    credentials: &GcsCredentials,
) -> Result<object_store::gcp::GoogleCloudStorage, object_store::Error> {
    GoogleCloudStorageBuilder::new()
        .with_bucket_name(&credentials.bucket)
        .with_service_account_key(credentials.service_account_json())
        .build()
}

fn unexpected(err: object_store::Error) -> ProviderError {
    ProviderError::Unexpected(err.to_string())
}

/// Keys are taken verbatim; `Path::from` would percent-encode characters
/// such as `#` or `%` and miss the stored object.
fn parse_location(key: &str) -> Result<Path, ProviderError> {
    Path::parse(key).map_err(|err| ProviderError::Unexpected(err.to_string()))
}

/// `""` and `"/"` address the bucket root.
fn prefix_path(prefix: &str) -> Result<Option<Path>, ProviderError> {
    let trimmed = prefix.trim_matches(FOLDER_SEPARATOR);
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_location(trimmed).map(Some)
}

#[async_trait]
impl StorageProvider for ObjectStoreAdapter {
    async fn test_connection(&self) -> Result<(), ProviderError> {
        let mut listing = self.store.list(None);
        match listing.next().await {
            Some(Err(err)) => Err(ProviderError::ConnectionFailed(err.to_string())),
            _ => {
                debug!("Connection to {} verified", self.label);
                Ok(())
            }
        }
    }

    async fn list_folders(&self) -> Result<Vec<String>, ProviderError> {
        let mut folders = Vec::new();
        let mut pending: VecDeque<Option<Path>> = VecDeque::from([None]);
        while let Some(prefix) = pending.pop_front() {
            let listing = self
                .store
                .list_with_delimiter(prefix.as_ref())
                .await
                .map_err(unexpected)?;
            for folder in listing.common_prefixes {
                folders.push(format!("{folder}{FOLDER_SEPARATOR}"));
                pending.push_back(Some(folder));
            }
        }
        folders.sort();
        info!("Found {} folder(s) in {}", folders.len(), self.label);
        Ok(folders)
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<FileInfo>, ProviderError> {
        let listed = prefix_path(prefix)?;
        let listing = self
            .store
            .list_with_delimiter(listed.as_ref())
            .await
            .map_err(unexpected)?;
        let folders: HashSet<&Path> = listing.common_prefixes.iter().collect();
        let mut files: Vec<FileInfo> = listing
            .objects
            .iter()
            .filter(|meta| !folders.contains(&meta.location))
            .filter(|meta| listed.as_ref() != Some(&meta.location))
            .filter_map(|meta| {
                let name = meta.location.filename()?.to_string();
                Some(FileInfo {
                    name,
                    size: meta.size as u64,
                    last_modified: meta.last_modified,
                })
            })
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        info!(
            "Found {} file(s) under '{}' in {}",
            files.len(),
            prefix,
            self.label
        );
        Ok(files)
    }

    async fn read_text(&self, path: &str, max_size: Option<u64>) -> Result<String, ProviderError> {
        let location = parse_location(path)?;
        let result = self.store.get(&location).await.map_err(unexpected)?;
        debug!(
            "Streaming '{}' ({} byte(s)) from {}",
            path, result.meta.size, self.label
        );
        let stream = result.into_stream().map_err(io::Error::other).boxed();
        let content = read_bounded(stream, path, max_size).await?;
        Ok(content)
    }
}

pub async fn test_connection(credentials: &ProviderCredentials) -> Result<(), ProviderError> {
    let adapter = ObjectStoreAdapter::from_credentials(credentials)
        .map_err(|err| ProviderError::ConnectionFailed(err.to_string()))?;
    adapter.test_connection().await
}

/// Builds a client for operations other than the connectivity probe.
pub fn connect(credentials: &ProviderCredentials) -> Result<ObjectStoreAdapter, ProviderError> {
    ObjectStoreAdapter::from_credentials(credentials).map_err(unexpected)
}

pub async fn list_folders(credentials: &ProviderCredentials) -> Result<Vec<String>, ProviderError> {
    let adapter = connect(credentials)?;
    adapter.list_folders().await
}

pub async fn list_files(
    credentials: &ProviderCredentials,
    prefix: &str,
) -> Result<Vec<FileInfo>, ProviderError> {
    let adapter = connect(credentials)?;
    adapter.list_files(prefix).await
}

pub async fn read_text(
    credentials: &ProviderCredentials,
    path: &str,
    max_size: Option<u64>,
) -> Result<String, ProviderError> {
    let adapter = connect(credentials)?;
    adapter.read_text(path, max_size).await
}
