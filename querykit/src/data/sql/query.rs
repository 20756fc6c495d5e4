//! SELECT assembly and execution

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};

use crate::data::error::DataError;
use crate::data::filters::Scalar;
use crate::utils::sql::number_placeholders;

use super::Backend;
use super::builder::{ROOT_ALIAS, SqlPath, SqlPredicate};

/// Complete `SELECT DISTINCT` over the root entity
///
/// Distinct rows keep to-many joins from duplicating root records.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    backend: Backend,
    table: String,
    joins: Vec<String>,
    predicate: SqlPredicate,
    order_by: Vec<String>,
    limit: Option<(u32, u32)>,
}

impl SelectQuery {
    pub(super) fn new(
        backend: Backend,
        table: &str,
        joins: Vec<String>,
        predicate: SqlPredicate,
    ) -> Self {
        Self {
            backend,
            table: table.to_string(),
            joins,
            predicate,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Order by a column path, NULLs last
    pub fn order_by(mut self, path: &SqlPath, desc: bool) -> Self {
        let clause = self
            .backend
            .dialect()
            .order_by_with_nulls(path.expr(), desc, true);
        self.order_by.push(clause);
        self
    }

    pub fn limit(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some((limit, offset));
        self
    }

    /// Bound values in placeholder order
    pub fn params(&self) -> &[Scalar] {
        &self.predicate.params
    }

    /// Render the statement with placeholders numbered for the dialect
    pub fn to_sql(&self) -> String {
        let dialect = self.backend.dialect();

        let mut sql = format!(
            "SELECT DISTINCT {}.* FROM {} AS {}",
            ROOT_ALIAS, self.table, ROOT_ALIAS
        );
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql.push_str(" WHERE ");
        sql.push_str(&self.predicate.sql);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some((limit, offset)) = self.limit {
            sql.push(' ');
            sql.push_str(&dialect.limit_offset(limit, offset));
        }

        number_placeholders(&sql, |i| dialect.placeholder(i))
    }

    /// Execute against SQLite
    ///
    /// Date-times are bound in their ISO-8601 text form, which orders
    /// chronologically in TEXT columns.
    pub async fn fetch_all<T>(&self, pool: &SqlitePool) -> Result<Vec<T>, DataError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        if self.backend != Backend::Sqlite {
            return Err(DataError::Config(format!(
                "Cannot execute a {} query on a SQLite pool",
                self.backend
            )));
        }

        let sql = self.to_sql();
        tracing::debug!(sql = %sql, params = self.params().len(), "Executing filtered select");

        let mut query = sqlx::query_as::<_, T>(&sql);
        for param in self.params() {
            query = match param {
                Scalar::Text(s) => query.bind(s.clone()),
                Scalar::Integer(i) => query.bind(*i),
                Scalar::Float(f) => query.bind(*f),
                Scalar::Bool(b) => query.bind(*b),
                Scalar::DateTime(_) => query.bind(param.to_text()),
            };
        }

        query.fetch_all(pool).await.map_err(DataError::from_sqlite)
    }
}
