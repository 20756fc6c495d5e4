//! Shared data types
//!
//! Row types returned by repositories, independent of the backing database.

mod transactional;

pub use transactional::FileRecord;
