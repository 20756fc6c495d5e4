//! File storage trait definition
//!
//! Defines the interface for file storage backends (filesystem, S3)

use std::time::Duration;

use async_trait::async_trait;

use super::error::FileStorageError;

/// Trait for file storage backends
///
/// All implementations must be thread-safe (Send + Sync) for use in async contexts.
/// Objects are addressed by slash-separated keys such as `files/{id}`.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Store an object, replacing any previous content under `key`
    async fn store(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), FileStorageError>;

    /// Retrieve an object
    ///
    /// # Returns
    /// Object bytes or NotFound error
    async fn get(&self, key: &str) -> Result<Vec<u8>, FileStorageError>;

    async fn exists(&self, key: &str) -> Result<bool, FileStorageError>;

    /// Delete an object
    ///
    /// # Notes
    /// Does not fail if the object doesn't exist.
    async fn delete(&self, key: &str) -> Result<(), FileStorageError>;

    /// URL a client can fetch the object from
    ///
    /// Presigned for remote stores; `expires_in` is ignored by backends whose
    /// URLs don't expire.
    async fn url(&self, key: &str, expires_in: Duration) -> Result<String, FileStorageError>;
}

/// Reject keys that could escape the storage root
///
/// Keys are non-empty runs of segments separated by `/`; empty, `.` and `..`
/// segments and backslashes are refused.
pub fn validate_key(key: &str) -> Result<(), FileStorageError> {
    let valid = !key.is_empty()
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(FileStorageError::InvalidKey(key.to_string()))
    }
}
