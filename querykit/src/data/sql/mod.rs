//! SQL backend for the filter system
//!
//! Renders criteria into parameterised SQL for SQLite and PostgreSQL:
//! - `dialect` - placeholder, collection and ordering syntax per database
//! - `schema` - entity, field and relation metadata resolving criteria keys
//! - `builder` - [`CriteriaBuilder`](crate::data::filters::CriteriaBuilder)
//!   implementation emitting WHERE fragments and JOIN clauses
//! - `query` - complete `SELECT DISTINCT` statements, executable on SQLite

mod builder;
mod dialect;
mod postgres_dialect;
mod query;
pub mod schema;
mod sqlite_dialect;

pub use builder::{ROOT_ALIAS, SqlCriteriaBuilder, SqlPath, SqlPredicate};
pub use dialect::SqlDialect;
pub use postgres_dialect::PostgresDialect;
pub use query::SelectQuery;
pub use schema::{EntitySchema, Field, Relation, RelationKind, Schema};
pub use sqlite_dialect::SqliteDialect;

use serde::{Deserialize, Serialize};

/// Database backend identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Postgres,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Sqlite => &SqliteDialect,
            Backend::Postgres => &PostgresDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        self.dialect().name()
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            _ => Err(format!(
                "Invalid SQL dialect '{}'. Valid options: sqlite, postgres",
                s
            )),
        }
    }
}
