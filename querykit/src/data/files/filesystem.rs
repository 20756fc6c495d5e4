//! Filesystem-based file storage implementation
//!
//! Stores each object at `{base_path}/{key}`, with `/` in the key mapped to
//! nested directories.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;

use super::error::FileStorageError;
use super::storage::{FileStorage, validate_key};

/// Filesystem-based file storage
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    /// Base path for file storage
    base_path: PathBuf,
}

impl FilesystemStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the full path for an object
    fn file_path(&self, key: &str) -> Result<PathBuf, FileStorageError> {
        validate_key(key)?;
        Ok(key
            .split('/')
            .fold(self.base_path.clone(), |path, segment| path.join(segment)))
    }

    async fn ensure_parent_dirs(&self, path: &Path) -> Result<(), FileStorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Clean up empty parent directories after deletion (best effort)
    async fn cleanup_empty_parents(&self, file_path: &Path) {
        let mut current = file_path.parent();

        while let Some(dir) = current {
            if dir == self.base_path || !dir.starts_with(&self.base_path) {
                break;
            }

            // Fails on non-empty directories, which ends the walk
            match fs::remove_dir(dir).await {
                Ok(_) => {
                    tracing::trace!(path = %dir.display(), "Removed empty directory");
                    current = dir.parent();
                }
                Err(_) => break,
            }
        }
    }
}

#[async_trait]
impl FileStorage for FilesystemStorage {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn store(
        &self,
        key: &str,
        data: &[u8],
        _content_type: Option<&str>,
    ) -> Result<(), FileStorageError> {
        let path = self.file_path(key)?;

        self.ensure_parent_dirs(&path).await?;
        fs::write(&path, data).await?;

        tracing::debug!(
            key,
            size = data.len(),
            path = %path.display(),
            "File stored"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, FileStorageError> {
        let path = self.file_path(key)?;

        // Map ENOENT instead of checking first; the file can vanish in between
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FileStorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                FileStorageError::Io(e)
            }
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, FileStorageError> {
        let path = self.file_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), FileStorageError> {
        let path = self.file_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, "File deleted");
                self.cleanup_empty_parents(&path).await;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileStorageError::Io(e)),
        }
    }

    async fn url(&self, key: &str, _expires_in: Duration) -> Result<String, FileStorageError> {
        let path = std::path::absolute(self.file_path(key)?)?;
        Ok(format!("file://{}", path.display()))
    }
}
