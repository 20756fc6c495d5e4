//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Collection columns (JSON arrays vs native arrays)
/// - Limit/offset clauses
/// - NULL ordering
///
/// Fragments produced here use `?` for every bound value. Placeholders are
/// numbered once, when the full statement is rendered.
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Generate SQL for checking if a collection column contains a value
    ///
    /// - SQLite: `EXISTS (SELECT 1 FROM json_each(col) WHERE value = ?)`
    /// - PostgreSQL: `? = ANY(col)`
    fn array_contains(&self, array_col: &str) -> String;

    /// Generate SQL for the element count of a collection column (0 for NULL)
    ///
    /// - SQLite: `COALESCE(json_array_length(col), 0)`
    /// - PostgreSQL: `COALESCE(cardinality(col), 0)`
    fn array_length(&self, array_col: &str) -> String;

    /// Generate LIMIT/OFFSET clause
    ///
    /// Most databases use `LIMIT x OFFSET y`, but syntax may vary.
    fn limit_offset(&self, limit: u32, offset: u32) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }

    /// Generate ORDER BY clause with NULL handling
    ///
    /// - PostgreSQL: `col DESC NULLS LAST`
    /// - SQLite: Doesn't support NULLS FIRST/LAST
    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String;
}
