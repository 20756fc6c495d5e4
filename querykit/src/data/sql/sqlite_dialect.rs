//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
///
/// SQLite's built-in `LOWER` and `LIKE` fold ASCII letters only, so the MATCH
/// operators are case-insensitive for ASCII text and case-sensitive for other
/// letters (`'Ärger'` does not match `"ä"`). The in-memory backend and
/// PostgreSQL fold full Unicode.
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn array_contains(&self, array_col: &str) -> String {
        // SQLite stores arrays as JSON text, use json_each to search
        format!(
            "EXISTS (SELECT 1 FROM json_each({}) WHERE value = ?)",
            array_col
        )
    }

    fn array_length(&self, array_col: &str) -> String {
        format!("COALESCE(json_array_length({}), 0)", array_col)
    }

    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String {
        // SQLite doesn't support NULLS FIRST/LAST, emulate with CASE
        let dir = if desc { "DESC" } else { "ASC" };
        if nulls_last {
            format!(
                "CASE WHEN {} IS NULL THEN 1 ELSE 0 END, {} {}",
                col, col, dir
            )
        } else {
            format!(
                "CASE WHEN {} IS NULL THEN 0 ELSE 1 END, {} {}",
                col, col, dir
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
    }

    #[test]
    fn test_array_contains() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.array_contains("r.tags"),
            "EXISTS (SELECT 1 FROM json_each(r.tags) WHERE value = ?)"
        );
    }

    #[test]
    fn test_array_length() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.array_length("r.tags"),
            "COALESCE(json_array_length(r.tags), 0)"
        );
    }

    #[test]
    fn test_order_by_with_nulls() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.order_by_with_nulls("r.birth_date", true, true),
            "CASE WHEN r.birth_date IS NULL THEN 1 ELSE 0 END, r.birth_date DESC"
        );
        assert_eq!(
            dialect.order_by_with_nulls("r.name", false, false),
            "CASE WHEN r.name IS NULL THEN 0 ELSE 1 END, r.name ASC"
        );
    }
}
