//! FileRepository trait implementation for SQLite

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::data::error::DataError;
use crate::data::traits::FileRepository;
use crate::data::types::FileRecord;

use super::SqliteService;
use super::repositories::file;

#[async_trait]
impl FileRepository for Arc<SqliteService> {
    async fn insert_file(&self, record: &FileRecord) -> Result<(), DataError> {
        file::insert_file(self.pool(), record)
            .await
            .map_err(Into::into)
    }

    async fn get_file(&self, id: &Uuid) -> Result<Option<FileRecord>, DataError> {
        file::get_file(self.pool(), id).await.map_err(Into::into)
    }

    async fn delete_file(&self, id: &Uuid) -> Result<bool, DataError> {
        file::delete_file(self.pool(), id).await.map_err(Into::into)
    }

    async fn list_files(&self, limit: u32) -> Result<Vec<FileRecord>, DataError> {
        file::list_files(self.pool(), limit)
            .await
            .map_err(Into::into)
    }
}
