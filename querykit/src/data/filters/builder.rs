//! Predicate-builder capability
//!
//! Operation rules only talk to this trait. A backend supplies navigation
//! (field access and joins) and predicate constructors; the rules never see
//! how predicates are represented.

use super::criterion::Scalar;
use super::error::FilterError;

/// Capability handed to operation rules to build query predicates
///
/// Navigation is fallible because a backend may know its schema and reject
/// unknown fields or relations. Predicate constructors are infallible except
/// where the path must denote a collection.
pub trait CriteriaBuilder {
    /// Handle to an entity or a field reached from the query root
    type Path: Clone;
    /// Boolean condition attachable to a query
    type Predicate;

    /// Field `name` on the entity at `from`
    fn get(&mut self, from: &Self::Path, name: &str) -> Result<Self::Path, FilterError>;

    /// Traverse a relationship (to-one or to-many)
    fn join(&mut self, from: &Self::Path, relation: &str) -> Result<Self::Path, FilterError>;

    /// Traverse a multi-valued relationship
    fn join_list(&mut self, from: &Self::Path, relation: &str) -> Result<Self::Path, FilterError>;

    /// Case-folded view of a textual field
    fn lower(&mut self, path: Self::Path) -> Self::Path;

    fn equal(&mut self, path: Self::Path, value: &Scalar) -> Self::Predicate;

    fn not_equal(&mut self, path: Self::Path, value: &Scalar) -> Self::Predicate;

    fn greater_than(&mut self, path: Self::Path, value: &Scalar) -> Self::Predicate;

    fn less_than(&mut self, path: Self::Path, value: &Scalar) -> Self::Predicate;

    fn greater_than_or_equal(&mut self, path: Self::Path, value: &Scalar) -> Self::Predicate;

    fn less_than_or_equal(&mut self, path: Self::Path, value: &Scalar) -> Self::Predicate;

    /// Case-sensitive SQL `LIKE` with `\` as the escape character
    fn like(&mut self, path: Self::Path, pattern: &str) -> Self::Predicate;

    fn is_null(&mut self, path: Self::Path) -> Self::Predicate;

    fn is_not_null(&mut self, path: Self::Path) -> Self::Predicate;

    /// `value` is an element of the collection-valued field at `collection`
    fn is_member(
        &mut self,
        value: &Scalar,
        collection: Self::Path,
    ) -> Result<Self::Predicate, FilterError>;

    fn in_list(&mut self, path: Self::Path, values: &[Scalar]) -> Self::Predicate;

    /// Complement of [`CriteriaBuilder::in_list`], null fields included
    fn not_in_list(&mut self, path: Self::Path, values: &[Scalar]) -> Self::Predicate;

    fn is_empty(&mut self, collection: Self::Path) -> Result<Self::Predicate, FilterError>;

    fn is_not_empty(&mut self, collection: Self::Path) -> Result<Self::Predicate, FilterError>;

    /// Conjunction; an empty list is always true
    fn and(&mut self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    /// Disjunction; an empty list is always false
    fn or(&mut self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    fn not(&mut self, predicate: Self::Predicate) -> Self::Predicate;
}
