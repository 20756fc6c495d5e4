//! Declarative filter system
//!
//! Turns a list of key/operation/value criteria into query predicates for any
//! backend implementing [`CriteriaBuilder`]. Operations cover equality,
//! ordering (text and date-time), case-insensitive matching, membership, null
//! and emptiness checks, and predicates reached through one or two
//! relationship joins.
//!
//! ## Usage
//!
//! ```no_run
//! use querykit::core::config::FiltersConfig;
//! use querykit::data::filters::{parse_criteria, to_predicate};
//! use querykit::data::memory::MemoryCriteriaBuilder;
//!
//! let json_str = r#"[{"key": "name", "operator": "MATCH", "value": "ann"}]"#;
//! let criteria = parse_criteria(json_str, &FiltersConfig::default()).unwrap();
//!
//! let mut builder = MemoryCriteriaBuilder::new();
//! let root = builder.root();
//! let predicate = to_predicate(&root, &criteria, &mut builder).unwrap();
//! ```

mod builder;
mod criterion;
mod error;
mod operation;
mod parser;
mod path;
mod rules;

pub use builder::CriteriaBuilder;
pub use criterion::{Criterion, CriterionValue, RawCriterion, Scalar, parse_datetime};
pub use error::FilterError;
pub use operation::{Operation, Rule, RuleFn, predicate_for};
pub use parser::{parse_criteria, validate_criterion};
pub use path::FieldPath;

/// Build one predicate per criterion, in order
pub fn to_predicates<B: CriteriaBuilder>(
    root: &B::Path,
    criteria: &[Criterion],
    builder: &mut B,
) -> Result<Vec<B::Predicate>, FilterError> {
    criteria
        .iter()
        .map(|criterion| predicate_for(root, criterion, builder))
        .collect()
}

/// Build the conjunction of all criteria (always true when empty)
pub fn to_predicate<B: CriteriaBuilder>(
    root: &B::Path,
    criteria: &[Criterion],
    builder: &mut B,
) -> Result<B::Predicate, FilterError> {
    let predicates = to_predicates(root, criteria, builder)?;
    Ok(builder.and(predicates))
}
