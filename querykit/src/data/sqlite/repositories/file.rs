//! File repository for SQLite operations
//!
//! Manages file metadata. Ids are stored as hyphenated UUID text.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::FileRecord;

type FileRow = (String, String, i64);

fn to_record((id, name, created_at): FileRow) -> Result<FileRecord, SqliteError> {
    let id =
        Uuid::parse_str(&id).map_err(|e| SqliteError::Database(sqlx::Error::Decode(e.into())))?;
    Ok(FileRecord {
        id,
        name,
        created_at,
    })
}

/// Insert a file record
///
/// Returns `Conflict` if a record with the same id exists.
pub async fn insert_file(pool: &SqlitePool, record: &FileRecord) -> Result<(), SqliteError> {
    let result = sqlx::query("INSERT INTO files (id, name, created_at) VALUES (?, ?, ?)")
        .bind(record.id.to_string())
        .bind(&record.name)
        .bind(record.created_at)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(SqliteError::Conflict(
            format!("File {} already exists", record.id),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Get a file by id
pub async fn get_file(pool: &SqlitePool, id: &Uuid) -> Result<Option<FileRecord>, SqliteError> {
    let row = sqlx::query_as::<_, FileRow>("SELECT id, name, created_at FROM files WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(to_record).transpose()
}

/// Delete a file metadata record
pub async fn delete_file(pool: &SqlitePool, id: &Uuid) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM files WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List file records, newest first
pub async fn list_files(pool: &SqlitePool, limit: u32) -> Result<Vec<FileRecord>, SqliteError> {
    let rows = sqlx::query_as::<_, FileRow>(
        r#"
        SELECT id, name, created_at
        FROM files
        ORDER BY created_at DESC, id
        LIMIT ?
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(to_record).collect()
}
