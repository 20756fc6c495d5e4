//! File storage error types

use thiserror::Error;
use uuid::Uuid;

use crate::data::error::DataError;

/// Errors from low-level file storage operations (filesystem/S3)
#[derive(Error, Debug)]
pub enum FileStorageError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Invalid object key: {0:?}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors from the high-level file service
#[derive(Error, Debug)]
pub enum FileServiceError {
    #[error("File not found: {id}")]
    NotFound { id: Uuid },

    #[error("Storage error: {0}")]
    Storage(#[from] FileStorageError),

    #[error("Database error: {0}")]
    Database(#[from] DataError),
}
