//! Operation catalog and dispatch
//!
//! Each operation tag maps to one [`Rule`]: the number of relationship hops its
//! key path must contain and a plain function that builds the predicate.
//! Adding an operation means adding a variant, a rule function and one arm
//! in [`Operation::rule`]; existing rules are untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::memory::MemoryCriteriaBuilder;

use super::builder::CriteriaBuilder;
use super::criterion::Criterion;
use super::error::FilterError;
use super::path::FieldPath;
use super::rules;

/// Filter operation tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Equal,
    NotEqual,
    EqualDate,
    NotEqualDate,
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
    GreaterThanDate,
    LessThanDate,
    GreaterThanEqualDate,
    LessThanEqualDate,
    GreaterThanEqualJoin,
    EqualJoin,
    Match,
    MatchStart,
    MatchEnd,
    MatchJoin,
    MatchJoinList,
    MatchJoinListObject,
    IsMember,
    In,
    NotIn,
    EqualNull,
    NotEqualNull,
    IsEmpty,
    IsNotEmpty,
}

/// Signature shared by every operation rule
pub type RuleFn<B> = fn(
    &<B as CriteriaBuilder>::Path,
    &FieldPath<'_>,
    &Criterion,
    &mut B,
) -> Result<<B as CriteriaBuilder>::Predicate, FilterError>;

/// Predicate-construction rule bound to an operation tag
pub struct Rule<B: CriteriaBuilder> {
    /// Relationship hops the key path must contain
    pub hops: usize,
    pub build: RuleFn<B>,
}

impl<B: CriteriaBuilder> Clone for Rule<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: CriteriaBuilder> Copy for Rule<B> {}

impl<B: CriteriaBuilder> Rule<B> {
    const fn new(hops: usize, build: RuleFn<B>) -> Self {
        Self { hops, build }
    }
}

impl Operation {
    pub const ALL: [Operation; 27] = [
        Self::Equal,
        Self::NotEqual,
        Self::EqualDate,
        Self::NotEqualDate,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterThanEqual,
        Self::LessThanEqual,
        Self::GreaterThanDate,
        Self::LessThanDate,
        Self::GreaterThanEqualDate,
        Self::LessThanEqualDate,
        Self::GreaterThanEqualJoin,
        Self::EqualJoin,
        Self::Match,
        Self::MatchStart,
        Self::MatchEnd,
        Self::MatchJoin,
        Self::MatchJoinList,
        Self::MatchJoinListObject,
        Self::IsMember,
        Self::In,
        Self::NotIn,
        Self::EqualNull,
        Self::NotEqualNull,
        Self::IsEmpty,
        Self::IsNotEmpty,
    ];

    /// Wire tag of the operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::NotEqual => "NOT_EQUAL",
            Self::EqualDate => "EQUAL_DATE",
            Self::NotEqualDate => "NOT_EQUAL_DATE",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::GreaterThanEqual => "GREATER_THAN_EQUAL",
            Self::LessThanEqual => "LESS_THAN_EQUAL",
            Self::GreaterThanDate => "GREATER_THAN_DATE",
            Self::LessThanDate => "LESS_THAN_DATE",
            Self::GreaterThanEqualDate => "GREATER_THAN_EQUAL_DATE",
            Self::LessThanEqualDate => "LESS_THAN_EQUAL_DATE",
            Self::GreaterThanEqualJoin => "GREATER_THAN_EQUAL_JOIN",
            Self::EqualJoin => "EQUAL_JOIN",
            Self::Match => "MATCH",
            Self::MatchStart => "MATCH_START",
            Self::MatchEnd => "MATCH_END",
            Self::MatchJoin => "MATCH_JOIN",
            Self::MatchJoinList => "MATCH_JOIN_LIST",
            Self::MatchJoinListObject => "MATCH_JOIN_LIST_OBJECT",
            Self::IsMember => "IS_MEMBER",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::EqualNull => "EQUAL_NULL",
            Self::NotEqualNull => "NOT_EQUAL_NULL",
            Self::IsEmpty => "IS_EMPTY",
            Self::IsNotEmpty => "IS_NOT_EMPTY",
        }
    }

    /// Relationship hops the key path must contain, as declared in the rule table
    ///
    /// Hop counts do not depend on the backend, so any builder can read them.
    pub fn hops(&self) -> usize {
        self.rule::<MemoryCriteriaBuilder>().hops
    }

    /// Null and emptiness checks ignore the value entirely
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            Self::EqualNull | Self::NotEqualNull | Self::IsEmpty | Self::IsNotEmpty
        )
    }

    /// Rule table entry for this operation
    pub fn rule<B: CriteriaBuilder>(self) -> Rule<B> {
        match self {
            Self::Equal => Rule::new(0, rules::equal),
            Self::NotEqual => Rule::new(0, rules::not_equal),
            Self::EqualDate => Rule::new(0, rules::equal_date),
            Self::NotEqualDate => Rule::new(0, rules::not_equal_date),
            Self::GreaterThan => Rule::new(0, rules::greater_than),
            Self::LessThan => Rule::new(0, rules::less_than),
            Self::GreaterThanEqual => Rule::new(0, rules::greater_than_equal),
            Self::LessThanEqual => Rule::new(0, rules::less_than_equal),
            Self::GreaterThanDate => Rule::new(0, rules::greater_than_date),
            Self::LessThanDate => Rule::new(0, rules::less_than_date),
            Self::GreaterThanEqualDate => Rule::new(0, rules::greater_than_equal_date),
            Self::LessThanEqualDate => Rule::new(0, rules::less_than_equal_date),
            Self::GreaterThanEqualJoin => Rule::new(1, rules::greater_than_equal_join),
            Self::EqualJoin => Rule::new(1, rules::equal_join),
            Self::Match => Rule::new(0, rules::match_contains),
            Self::MatchStart => Rule::new(0, rules::match_start),
            Self::MatchEnd => Rule::new(0, rules::match_end),
            Self::MatchJoin => Rule::new(1, rules::match_join),
            Self::MatchJoinList => Rule::new(1, rules::match_join_list),
            Self::MatchJoinListObject => Rule::new(2, rules::match_join_list_object),
            Self::IsMember => Rule::new(0, rules::is_member),
            Self::In => Rule::new(0, rules::in_list),
            Self::NotIn => Rule::new(0, rules::not_in_list),
            Self::EqualNull => Rule::new(0, rules::equal_null),
            Self::NotEqualNull => Rule::new(0, rules::not_equal_null),
            Self::IsEmpty => Rule::new(0, rules::is_empty),
            Self::IsNotEmpty => Rule::new(0, rules::is_not_empty),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| FilterError::UnknownOperation(tag.to_string()))
    }
}

/// Build the predicate for one criterion against `root`.
///
/// The key path is validated against the rule's declared hop count and the value
/// presence is checked before the rule runs. Either a predicate is returned or
/// the whole criterion fails.
pub fn predicate_for<B: CriteriaBuilder>(
    root: &B::Path,
    criterion: &Criterion,
    builder: &mut B,
) -> Result<B::Predicate, FilterError> {
    let operation = criterion.operator();
    let rule = operation.rule::<B>();

    if operation.requires_value() && criterion.value().is_absent() {
        return Err(FilterError::MissingValue {
            key: criterion.key().to_string(),
            operation,
        });
    }

    let path = FieldPath::parse(criterion.key(), operation, rule.hops)?;

    tracing::trace!(
        key = criterion.key(),
        operation = %operation,
        hops = rule.hops,
        "Building filter predicate"
    );

    (rule.build)(root, &path, criterion, builder)
}
