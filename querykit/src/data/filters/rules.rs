//! Operation rules
//!
//! One function per operation tag. Key paths arrive validated against the
//! rule's hop count; a path with fewer relations than a rule reads still
//! fails with `InvalidKeyPath` instead of panicking.

use crate::utils::sql::escape_like_pattern;

use super::builder::CriteriaBuilder;
use super::criterion::{Criterion, Scalar};
use super::error::FilterError;
use super::path::FieldPath;

type RuleResult<B> = Result<<B as CriteriaBuilder>::Predicate, FilterError>;

/// Where the `%` wildcards go around a MATCH value
#[derive(Debug, Clone, Copy)]
enum MatchMode {
    Contains,
    StartsWith,
    EndsWith,
}

impl MatchMode {
    fn pattern(self, value: &Scalar) -> String {
        let escaped = escape_like_pattern(&value.to_text().to_lowercase());
        match self {
            Self::Contains => format!("%{}%", escaped),
            Self::StartsWith => format!("{}%", escaped),
            Self::EndsWith => format!("%{}", escaped),
        }
    }
}

/// Field on the root entity
fn field<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    builder: &mut B,
) -> Result<B::Path, FilterError> {
    builder.get(root, path.field())
}

/// Relation at `index` along the key path
fn relation<'a>(
    path: &FieldPath<'a>,
    criterion: &Criterion,
    index: usize,
) -> Result<&'a str, FilterError> {
    path.relations()
        .get(index)
        .copied()
        .ok_or_else(|| FilterError::InvalidKeyPath {
            key: criterion.key().to_string(),
            operation: criterion.operator(),
            expected: index + 2,
            found: path.relations().len() + 1,
        })
}

/// Field on the target of a single join from the root
fn joined_field<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> Result<B::Path, FilterError> {
    let join = builder.join(root, relation(path, criterion, 0)?)?;
    builder.get(&join, path.field())
}

/// Text operand in string form
fn text(criterion: &Criterion) -> Result<Scalar, FilterError> {
    criterion.scalar().map(|s| Scalar::Text(s.to_text()))
}

/// Date-time operand parsed from the value
fn datetime(criterion: &Criterion) -> Result<Scalar, FilterError> {
    criterion.scalar()?.to_datetime().map(Scalar::DateTime)
}

fn like<B: CriteriaBuilder>(
    target: B::Path,
    criterion: &Criterion,
    mode: MatchMode,
    builder: &mut B,
) -> RuleResult<B> {
    let pattern = mode.pattern(criterion.scalar()?);
    let lowered = builder.lower(target);
    Ok(builder.like(lowered, &pattern))
}

pub(super) fn equal<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = field(root, path, builder)?;
    Ok(builder.equal(target, criterion.scalar()?))
}

pub(super) fn not_equal<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = field(root, path, builder)?;
    Ok(builder.not_equal(target, criterion.scalar()?))
}

pub(super) fn equal_date<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = datetime(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.equal(target, &value))
}

pub(super) fn not_equal_date<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = datetime(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.not_equal(target, &value))
}

pub(super) fn greater_than<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = text(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.greater_than(target, &value))
}

pub(super) fn less_than<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = text(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.less_than(target, &value))
}

pub(super) fn greater_than_equal<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = text(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.greater_than_or_equal(target, &value))
}

pub(super) fn less_than_equal<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = text(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.less_than_or_equal(target, &value))
}

pub(super) fn greater_than_date<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = datetime(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.greater_than(target, &value))
}

pub(super) fn less_than_date<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = datetime(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.less_than(target, &value))
}

pub(super) fn greater_than_equal_date<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = datetime(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.greater_than_or_equal(target, &value))
}

pub(super) fn less_than_equal_date<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = datetime(criterion)?;
    let target = field(root, path, builder)?;
    Ok(builder.less_than_or_equal(target, &value))
}

pub(super) fn greater_than_equal_join<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = text(criterion)?;
    let target = joined_field(root, path, criterion, builder)?;
    Ok(builder.greater_than_or_equal(target, &value))
}

pub(super) fn equal_join<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = joined_field(root, path, criterion, builder)?;
    Ok(builder.equal(target, criterion.scalar()?))
}

pub(super) fn match_contains<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = field(root, path, builder)?;
    like(target, criterion, MatchMode::Contains, builder)
}

pub(super) fn match_start<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = field(root, path, builder)?;
    like(target, criterion, MatchMode::StartsWith, builder)
}

pub(super) fn match_end<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = field(root, path, builder)?;
    like(target, criterion, MatchMode::EndsWith, builder)
}

pub(super) fn match_join<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = joined_field(root, path, criterion, builder)?;
    like(target, criterion, MatchMode::Contains, builder)
}

pub(super) fn match_join_list<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let join = builder.join_list(root, relation(path, criterion, 0)?)?;
    let target = builder.get(&join, path.field())?;
    like(target, criterion, MatchMode::Contains, builder)
}

pub(super) fn match_join_list_object<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let list = builder.join_list(root, relation(path, criterion, 0)?)?;
    let object = builder.join(&list, relation(path, criterion, 1)?)?;
    let target = builder.get(&object, path.field())?;
    like(target, criterion, MatchMode::Contains, builder)
}

pub(super) fn is_member<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let value = criterion.scalar()?.clone();
    let collection = field(root, path, builder)?;
    builder.is_member(&value, collection)
}

pub(super) fn in_list<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let values = criterion.list()?;
    let target = field(root, path, builder)?;
    Ok(builder.in_list(target, &values))
}

pub(super) fn not_in_list<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let values = criterion.list()?;
    let target = field(root, path, builder)?;
    Ok(builder.not_in_list(target, &values))
}

pub(super) fn equal_null<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    _criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = field(root, path, builder)?;
    Ok(builder.is_null(target))
}

pub(super) fn not_equal_null<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    _criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let target = field(root, path, builder)?;
    Ok(builder.is_not_null(target))
}

pub(super) fn is_empty<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    _criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let collection = field(root, path, builder)?;
    builder.is_empty(collection)
}

pub(super) fn is_not_empty<B: CriteriaBuilder>(
    root: &B::Path,
    path: &FieldPath<'_>,
    _criterion: &Criterion,
    builder: &mut B,
) -> RuleResult<B> {
    let collection = field(root, path, builder)?;
    builder.is_not_empty(collection)
}
