//! Repository traits for database backends
//!
//! Services depend on these traits rather than a concrete database, so the
//! metadata store can be swapped without touching them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::data::error::DataError;
use crate::data::types::FileRecord;

/// Repository trait for file metadata
///
/// Implemented by the SQLite backend.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a new file record
    ///
    /// Fails with `DataError::Conflict` if the id is already taken.
    async fn insert_file(&self, record: &FileRecord) -> Result<(), DataError>;

    /// Get a file record by id
    async fn get_file(&self, id: &Uuid) -> Result<Option<FileRecord>, DataError>;

    /// Delete a file record, returning whether it existed
    async fn delete_file(&self, id: &Uuid) -> Result<bool, DataError>;

    /// List records, newest first
    async fn list_files(&self, limit: u32) -> Result<Vec<FileRecord>, DataError>;
}
