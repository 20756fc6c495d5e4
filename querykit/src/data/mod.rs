//! Data layer
//!
//! - `filters` - Declarative criteria and the operation rule table
//! - `sql` - SQL backend for the filters (SQLite, PostgreSQL)
//! - `memory` - In-memory backend for the filters over JSON records
//! - `files` - Binary file storage with metadata
//! - `sqlite` - Metadata database
//! - `types` - Row types shared by repositories
//! - `traits` - Repository traits
//! - `error` - Unified error type for the data layer

pub mod error;
pub mod files;
pub mod filters;
pub mod memory;
pub mod sql;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use sqlite::SqliteService;
pub use traits::FileRepository;
pub use types::FileRecord;
