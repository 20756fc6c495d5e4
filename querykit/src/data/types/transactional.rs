//! Types for the transactional (metadata) database

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored file metadata
///
/// Only the id and the original name are persisted; the bytes live in the
/// configured storage backend under a key derived from `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    /// Unix seconds
    pub created_at: i64,
}

impl FileRecord {
    /// New record with a random id, stamped now
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_distinct_ids() {
        let a = FileRecord::new("a.txt");
        let b = FileRecord::new("a.txt");
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "a.txt");
        assert!(a.created_at > 0);
    }

    #[test]
    fn test_serializes_id_as_string() {
        let record = FileRecord {
            id: Uuid::nil(),
            name: "report.pdf".to_string(),
            created_at: 1_700_000_000,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "report.pdf");
    }
}
