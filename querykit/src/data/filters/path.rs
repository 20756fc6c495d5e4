//! Key-path decoding
//!
//! A criterion key is either a bare field (`name`), one relationship hop
//! (`address.city`) or two hops (`orders.product.title`). The number of hops is
//! declared by the operation's rule and checked before the rule runs.

use super::error::FilterError;
use super::operation::Operation;

/// A validated field path: zero or more relations followed by a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath<'a> {
    relations: Vec<&'a str>,
    field: &'a str,
}

impl<'a> FieldPath<'a> {
    /// Split `key` on `.` and require exactly `hops + 1` non-empty segments.
    ///
    /// Extra segments are rejected as well as missing ones. `operation` only
    /// labels the error.
    pub fn parse(key: &'a str, operation: Operation, hops: usize) -> Result<Self, FilterError> {
        let expected = hops + 1;
        let segments: Vec<&str> = key.split('.').collect();

        if segments.len() != expected || segments.iter().any(|s| s.trim().is_empty()) {
            return Err(FilterError::InvalidKeyPath {
                key: key.to_string(),
                operation,
                expected,
                found: segments.iter().filter(|s| !s.trim().is_empty()).count(),
            });
        }

        let (field, relations) = segments
            .split_last()
            .map(|(field, relations)| (*field, relations.to_vec()))
            .ok_or_else(|| FilterError::InvalidKeyPath {
                key: key.to_string(),
                operation,
                expected,
                found: 0,
            })?;

        Ok(Self { relations, field })
    }

    /// Relations traversed from the root, in order
    pub fn relations(&self) -> &[&'a str] {
        &self.relations
    }

    /// Field read on the last join target (or on the root when there are no hops)
    pub fn field(&self) -> &'a str {
        self.field
    }
}
