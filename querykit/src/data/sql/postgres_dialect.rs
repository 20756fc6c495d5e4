//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn array_contains(&self, array_col: &str) -> String {
        format!("? = ANY({})", array_col)
    }

    fn array_length(&self, array_col: &str) -> String {
        format!("COALESCE(cardinality({}), 0)", array_col)
    }

    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String {
        let dir = if desc { "DESC" } else { "ASC" };
        let nulls = if nulls_last {
            "NULLS LAST"
        } else {
            "NULLS FIRST"
        };
        format!("{} {} {}", col, dir, nulls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(5), "$5");
    }

    #[test]
    fn test_array_contains() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.array_contains("r.tags"), "? = ANY(r.tags)");
    }

    #[test]
    fn test_array_length() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.array_length("r.tags"),
            "COALESCE(cardinality(r.tags), 0)"
        );
    }

    #[test]
    fn test_order_by_with_nulls() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.order_by_with_nulls("r.name", true, true),
            "r.name DESC NULLS LAST"
        );
    }
}
