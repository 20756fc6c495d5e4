//! File storage layer
//!
//! Keeps file bytes in an object store and `(id, name)` metadata in the
//! metadata database.
//!
//! ## Architecture
//!
//! - `storage` - Trait definition for file storage backends
//! - `filesystem` - Local filesystem implementation
//! - `s3` - S3 implementation with presigned URLs
//! - `error` - Error types for file operations
//!
//! ## Storage Layout
//!
//! Every file is stored under `{prefix}/{id}`, where `id` is the UUID of its
//! metadata record:
//! ```text
//! {base_path or bucket}/
//! └── {prefix}/
//!     └── {id}
//! ```
//!
//! ## Usage
//!
//! ```text
//! let files = FileService::new(config, repository).await?;
//!
//! let id = files.upload_file(&FileUpload::new("report.pdf", bytes)).await?;
//! let url = files.get_file_url(id).await?;
//! files.delete_file(id).await?;
//! ```

pub mod error;
pub mod filesystem;
pub mod s3;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::core::config::{FilesConfig, StorageBackend};
use crate::data::traits::FileRepository;
use crate::data::types::FileRecord;
use crate::utils::file::expand_path;

pub use error::{FileServiceError, FileStorageError};
pub use filesystem::FilesystemStorage;
pub use s3::S3Storage;
pub use storage::FileStorage;

/// A file handed to the service for storing
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original file name, persisted as metadata
    pub name: String,
    /// MIME type if known
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// File service coordinating storage and metadata
pub struct FileService {
    /// Storage backend (filesystem or S3)
    storage: Arc<dyn FileStorage>,
    /// Metadata repository
    repository: Arc<dyn FileRepository>,
    config: FilesConfig,
}

impl FileService {
    /// Create a file service with the backend selected by `config`
    ///
    /// This function is async because S3 storage initialization requires loading AWS config.
    pub async fn new(
        config: FilesConfig,
        repository: Arc<dyn FileRepository>,
    ) -> Result<Self, FileServiceError> {
        let storage: Arc<dyn FileStorage> = match config.storage {
            StorageBackend::S3 => {
                let s3_config = config.s3.as_ref().ok_or_else(|| {
                    FileServiceError::Storage(FileStorageError::Backend(
                        "S3 storage configured but no s3 config provided (missing bucket)"
                            .to_string(),
                    ))
                })?;

                let s3_storage = S3Storage::new(
                    s3_config.bucket.clone(),
                    s3_config.region.clone(),
                    s3_config.endpoint.clone(),
                )
                .await?;

                Arc::new(s3_storage)
            }
            StorageBackend::Filesystem => Arc::new(FilesystemStorage::new(expand_path(
                &config.filesystem_path,
            ))),
        };

        Ok(Self::with_storage(config, storage, repository))
    }

    /// Create a file service over an existing storage backend
    pub fn with_storage(
        config: FilesConfig,
        storage: Arc<dyn FileStorage>,
        repository: Arc<dyn FileRepository>,
    ) -> Self {
        tracing::debug!(
            storage = storage.name(),
            prefix = %config.prefix,
            url_expiry_secs = config.url_expiry_secs,
            "File service initialized"
        );

        Self {
            storage,
            repository,
            config,
        }
    }

    /// Storage key for a file id
    pub fn object_key(&self, id: &Uuid) -> String {
        if self.config.prefix.is_empty() {
            id.to_string()
        } else {
            format!("{}/{}", self.config.prefix, id)
        }
    }

    /// Register a file without storing its content
    ///
    /// The bytes are expected to be written to [`Self::object_key`] later,
    /// e.g. by a client uploading directly to the object store.
    pub async fn init_file(&self, upload: &FileUpload) -> Result<Uuid, FileServiceError> {
        let record = FileRecord::new(&upload.name);
        self.repository.insert_file(&record).await?;

        tracing::debug!(id = %record.id, name = %record.name, "File initialized");
        Ok(record.id)
    }

    /// Store a file's metadata and content
    ///
    /// If the storage write fails the metadata is removed again so no record
    /// points at missing content.
    pub async fn upload_file(&self, upload: &FileUpload) -> Result<Uuid, FileServiceError> {
        let record = FileRecord::new(&upload.name);
        self.repository.insert_file(&record).await?;

        let key = self.object_key(&record.id);
        if let Err(e) = self
            .storage
            .store(&key, &upload.data, upload.content_type.as_deref())
            .await
        {
            if let Err(cleanup) = self.repository.delete_file(&record.id).await {
                tracing::warn!(
                    id = %record.id,
                    error = %cleanup,
                    "Failed to remove metadata after storage error"
                );
            }
            return Err(e.into());
        }

        tracing::debug!(
            id = %record.id,
            name = %record.name,
            size = upload.data.len(),
            "File uploaded"
        );
        Ok(record.id)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, FileServiceError> {
        Ok(self.repository.get_file(&id).await?)
    }

    /// Like [`Self::find_by_id`] but a missing record is an error
    pub async fn get_file_by_id(&self, id: Uuid) -> Result<FileRecord, FileServiceError> {
        self.find_by_id(id)
            .await?
            .ok_or(FileServiceError::NotFound { id })
    }

    /// Download URL for a stored file
    pub async fn get_file_url(&self, id: Uuid) -> Result<String, FileServiceError> {
        let record = self.get_file_by_id(id).await?;
        self.url_for(&record).await
    }

    /// Download URLs for several records, in input order
    pub async fn get_files_urls(
        &self,
        records: &[FileRecord],
    ) -> Result<Vec<String>, FileServiceError> {
        let mut urls = Vec::with_capacity(records.len());
        for record in records {
            urls.push(self.url_for(record).await?);
        }
        Ok(urls)
    }

    /// Content of a stored file
    pub async fn read_file(&self, id: Uuid) -> Result<Vec<u8>, FileServiceError> {
        let record = self.get_file_by_id(id).await?;
        let key = self.object_key(&record.id);
        self.storage.get(&key).await.map_err(|e| match e {
            FileStorageError::NotFound { .. } => FileServiceError::NotFound { id },
            e => FileServiceError::Storage(e),
        })
    }

    /// Delete a file's content and metadata
    ///
    /// Content goes first; metadata is only removed once the storage delete
    /// succeeded, so a failed delete can be retried.
    pub async fn delete_file(&self, id: Uuid) -> Result<(), FileServiceError> {
        let record = self.get_file_by_id(id).await?;
        let key = self.object_key(&record.id);

        self.storage.delete(&key).await?;
        self.repository.delete_file(&record.id).await?;

        tracing::debug!(id = %id, "File deleted");
        Ok(())
    }

    async fn url_for(&self, record: &FileRecord) -> Result<String, FileServiceError> {
        let key = self.object_key(&record.id);
        let expires_in = Duration::from_secs(self.config.url_expiry_secs);
        Ok(self.storage.url(&key, expires_in).await?)
    }
}
