//! SQLite repositories
//!
//! Row types are imported from `crate::data::types`.

pub mod file;

pub use file::{delete_file, get_file, insert_file, list_files};
