//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unique constraint hit, e.g. a reused file id
    #[error("Conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failed_error_display() {
        let err = SqliteError::MigrationFailed {
            version: 2,
            name: "add_files_table".to_string(),
            error: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 2 (add_files_table) failed: syntax error"
        );
    }

    #[test]
    fn test_sqlx_error_from() {
        let err: SqliteError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, SqliteError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let sqlite_err: SqliteError = io_err.into();
        assert!(sqlite_err.to_string().contains("read-only"));
    }
}
