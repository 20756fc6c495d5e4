//! In-memory backend for the filter system
//!
//! Evaluates criteria against JSON records (`serde_json::Value` objects).
//! Joins follow nested objects and arrays: a relation holding an object is a
//! to-one join, one holding an array is a to-many join. A path resolves to
//! every value reachable through its joins, and a predicate holds when any of
//! them satisfies it. Records whose relation is missing or null drop out, the
//! way an inner join would.

mod compare;

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use crate::data::filters::{CriteriaBuilder, FilterError, Scalar};

use self::compare::{compare, like, text_of};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Field(String),
    Join(String),
    JoinList(String),
}

/// Navigation steps from the record root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPath {
    steps: Vec<Step>,
    lowered: bool,
}

impl MemoryPath {
    fn then(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            steps,
            lowered: self.lowered,
        }
    }

    /// Values reachable from `record`; a missing field resolves to null
    fn resolve(&self, record: &Value) -> Vec<Value> {
        let mut current = vec![record.clone()];
        for step in &self.steps {
            current = match step {
                Step::Field(name) => current
                    .iter()
                    .map(|v| v.get(name).cloned().unwrap_or(Value::Null))
                    .collect(),
                Step::Join(name) | Step::JoinList(name) => current
                    .iter()
                    .flat_map(|v| match v.get(name) {
                        Some(Value::Array(items)) => items.clone(),
                        Some(Value::Null) | None => Vec::new(),
                        Some(other) => vec![other.clone()],
                    })
                    .filter(|v| !v.is_null())
                    .collect(),
            };
        }

        if self.lowered {
            current
                .into_iter()
                .map(|v| match v {
                    Value::Null => Value::Null,
                    other => Value::String(text_of(&other).to_lowercase()),
                })
                .collect()
        } else {
            current
        }
    }
}

type Test = dyn Fn(&Value) -> bool + Send + Sync;

/// Compiled predicate over a JSON record
#[derive(Clone)]
pub struct MemoryPredicate(Arc<Test>);

impl MemoryPredicate {
    fn new(test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(test))
    }

    /// Holds when any value reachable through `path` satisfies `test`
    fn any(path: MemoryPath, test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self::new(move |record| path.resolve(record).iter().any(&test))
    }

    fn ordering(path: MemoryPath, value: &Scalar, accept: fn(Ordering) -> bool) -> Self {
        let value = value.clone();
        Self::any(path, move |v| compare(v, &value).is_some_and(accept))
    }

    pub fn matches(&self, record: &Value) -> bool {
        (self.0)(record)
    }

    /// Records satisfying the predicate, in input order
    pub fn filter<'a>(&self, records: &'a [Value]) -> Vec<&'a Value> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

impl std::fmt::Debug for MemoryPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MemoryPredicate")
    }
}

/// Elements of a collection value; null counts as empty, scalars and objects
/// are not collections
fn elements(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) => Some(items.as_slice()),
        Value::Null => Some(&[][..]),
        _ => None,
    }
}

fn in_values(v: &Value, values: &[Scalar]) -> bool {
    values.iter().any(|s| compare(v, s) == Some(Ordering::Equal))
}

/// Criteria builder over JSON records
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryCriteriaBuilder;

impl MemoryCriteriaBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Path of the record itself
    pub fn root(&self) -> MemoryPath {
        MemoryPath::default()
    }
}

impl CriteriaBuilder for MemoryCriteriaBuilder {
    type Path = MemoryPath;
    type Predicate = MemoryPredicate;

    fn get(&mut self, from: &MemoryPath, name: &str) -> Result<MemoryPath, FilterError> {
        Ok(from.then(Step::Field(name.to_string())))
    }

    fn join(&mut self, from: &MemoryPath, relation: &str) -> Result<MemoryPath, FilterError> {
        Ok(from.then(Step::Join(relation.to_string())))
    }

    fn join_list(&mut self, from: &MemoryPath, relation: &str) -> Result<MemoryPath, FilterError> {
        Ok(from.then(Step::JoinList(relation.to_string())))
    }

    fn lower(&mut self, mut path: MemoryPath) -> MemoryPath {
        path.lowered = true;
        path
    }

    fn equal(&mut self, path: MemoryPath, value: &Scalar) -> MemoryPredicate {
        MemoryPredicate::ordering(path, value, Ordering::is_eq)
    }

    fn not_equal(&mut self, path: MemoryPath, value: &Scalar) -> MemoryPredicate {
        MemoryPredicate::ordering(path, value, Ordering::is_ne)
    }

    fn greater_than(&mut self, path: MemoryPath, value: &Scalar) -> MemoryPredicate {
        MemoryPredicate::ordering(path, value, Ordering::is_gt)
    }

    fn less_than(&mut self, path: MemoryPath, value: &Scalar) -> MemoryPredicate {
        MemoryPredicate::ordering(path, value, Ordering::is_lt)
    }

    fn greater_than_or_equal(&mut self, path: MemoryPath, value: &Scalar) -> MemoryPredicate {
        MemoryPredicate::ordering(path, value, Ordering::is_ge)
    }

    fn less_than_or_equal(&mut self, path: MemoryPath, value: &Scalar) -> MemoryPredicate {
        MemoryPredicate::ordering(path, value, Ordering::is_le)
    }

    fn like(&mut self, path: MemoryPath, pattern: &str) -> MemoryPredicate {
        let pattern = pattern.to_string();
        MemoryPredicate::any(path, move |v| !v.is_null() && like(&text_of(v), &pattern))
    }

    fn is_null(&mut self, path: MemoryPath) -> MemoryPredicate {
        MemoryPredicate::any(path, Value::is_null)
    }

    fn is_not_null(&mut self, path: MemoryPath) -> MemoryPredicate {
        MemoryPredicate::any(path, |v| !v.is_null())
    }

    fn is_member(
        &mut self,
        value: &Scalar,
        collection: MemoryPath,
    ) -> Result<MemoryPredicate, FilterError> {
        let value = value.clone();
        Ok(MemoryPredicate::any(collection, move |v| {
            elements(v).is_some_and(|items| {
                items
                    .iter()
                    .any(|e| compare(e, &value) == Some(Ordering::Equal))
            })
        }))
    }

    fn in_list(&mut self, path: MemoryPath, values: &[Scalar]) -> MemoryPredicate {
        let values = values.to_vec();
        MemoryPredicate::any(path, move |v| in_values(v, &values))
    }

    fn not_in_list(&mut self, path: MemoryPath, values: &[Scalar]) -> MemoryPredicate {
        let inside = self.in_list(path, values);
        self.not(inside)
    }

    fn is_empty(&mut self, collection: MemoryPath) -> Result<MemoryPredicate, FilterError> {
        Ok(MemoryPredicate::any(collection, |v| {
            elements(v).is_some_and(<[Value]>::is_empty)
        }))
    }

    fn is_not_empty(&mut self, collection: MemoryPath) -> Result<MemoryPredicate, FilterError> {
        Ok(MemoryPredicate::any(collection, |v| {
            elements(v).is_some_and(|items| !items.is_empty())
        }))
    }

    fn and(&mut self, predicates: Vec<MemoryPredicate>) -> MemoryPredicate {
        MemoryPredicate::new(move |record| predicates.iter().all(|p| p.matches(record)))
    }

    fn or(&mut self, predicates: Vec<MemoryPredicate>) -> MemoryPredicate {
        MemoryPredicate::new(move |record| predicates.iter().any(|p| p.matches(record)))
    }

    fn not(&mut self, predicate: MemoryPredicate) -> MemoryPredicate {
        MemoryPredicate::new(move |record| !predicate.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::data::filters::{Criterion, Operation, predicate_for, to_predicate};

    fn people() -> Vec<Value> {
        vec![
            json!({
                "id": 1, "name": "Anna", "age": 34, "birthDate": "1990-05-01T00:00:00",
                "tags": ["vip", "early"],
                "address": {"city": "Berlin", "zip": "10115"},
                "pets": [
                    {"name": "Rex", "vet": {"city": "Hamburg"}},
                    {"name": "Tom", "vet": {"city": "Berlin"}}
                ]
            }),
            json!({
                "id": 2, "name": "Hannah", "age": 25, "birthDate": "2001-03-15T00:00:00",
                "tags": [],
                "address": {"city": "Hamburg", "zip": "20095"},
                "pets": [{"name": "Bella", "vet": {"city": "Berlin"}}]
            }),
            json!({
                "id": 3, "name": "Bob", "age": 41, "birthDate": "2000-01-01T00:00:00",
                "tags": null, "address": null, "pets": []
            }),
            json!({
                "id": 4, "name": "banana", "tags": ["late"],
                "address": {"city": "Berlin", "zip": "10115"}
            }),
            json!({
                "id": 5, "name": null, "age": 19, "birthDate": "2005-07-20T12:30:00",
                "tags": ["vip"],
                "address": {"city": "Hamburg", "zip": "20095"}
            }),
        ]
    }

    fn ids_matching(records: &[Value], predicate: &MemoryPredicate) -> Vec<i64> {
        predicate
            .filter(records)
            .into_iter()
            .filter_map(|r| r["id"].as_i64())
            .collect()
    }

    fn select(criteria: &[Criterion]) -> Result<Vec<i64>, FilterError> {
        let mut builder = MemoryCriteriaBuilder::new();
        let root = builder.root();
        let predicate = to_predicate(&root, criteria, &mut builder)?;
        Ok(ids_matching(&people(), &predicate))
    }

    fn ids(criterion: Criterion) -> Vec<i64> {
        select(&[criterion]).unwrap()
    }

    /// One criterion per operation with the records it must select
    fn catalog() -> Vec<(Criterion, Vec<i64>)> {
        use Operation::*;
        vec![
            (Criterion::new("name", Equal, "Bob"), vec![3]),
            (Criterion::new("age", NotEqual, 34_i64), vec![2, 3, 5]),
            (Criterion::new("birthDate", EqualDate, "2000-01-01T00:00"), vec![3]),
            (
                Criterion::new("birthDate", NotEqualDate, "2005-07-20T12:30:00"),
                vec![1, 2, 3],
            ),
            (Criterion::new("age", GreaterThan, 30_i64), vec![1, 3]),
            (Criterion::new("name", LessThan, "B"), vec![1]),
            (Criterion::new("age", GreaterThanEqual, "34"), vec![1, 3]),
            (Criterion::new("age", LessThanEqual, 25_i64), vec![2, 5]),
            (
                Criterion::new("birthDate", GreaterThanDate, "2000-01-01T00:00:00"),
                vec![2, 5],
            ),
            (
                Criterion::new("birthDate", LessThanDate, "2000-01-01T00:00:00"),
                vec![1],
            ),
            (
                Criterion::new("birthDate", GreaterThanEqualDate, "2000-01-01T00:00:00"),
                vec![2, 3, 5],
            ),
            (
                Criterion::new("birthDate", LessThanEqualDate, "2000-01-01T00:00:00"),
                vec![1, 3],
            ),
            (
                Criterion::new("address.zip", GreaterThanEqualJoin, "2"),
                vec![2, 5],
            ),
            (Criterion::new("address.zip", EqualJoin, "20095"), vec![2, 5]),
            (Criterion::new("name", Match, "an"), vec![1, 2, 4]),
            (Criterion::new("name", MatchStart, "AN"), vec![1]),
            (Criterion::new("name", MatchEnd, "ah"), vec![2]),
            (Criterion::new("address.city", MatchJoin, "BER"), vec![1, 4]),
            (Criterion::new("pets.name", MatchJoinList, "e"), vec![1, 2]),
            (
                Criterion::new("pets.vet.city", MatchJoinListObject, "hamburg"),
                vec![1],
            ),
            (Criterion::new("tags", IsMember, "vip"), vec![1, 5]),
            (Criterion::new("name", In, vec!["Anna", "Bob", "Zed"]), vec![1, 3]),
            (
                Criterion::new("name", NotIn, vec!["Anna", "Bob", "Zed"]),
                vec![2, 4, 5],
            ),
            (Criterion::without_value("name", EqualNull), vec![5]),
            (Criterion::without_value("age", NotEqualNull), vec![1, 2, 3, 5]),
            (Criterion::without_value("tags", IsEmpty), vec![2, 3]),
            (Criterion::without_value("tags", IsNotEmpty), vec![1, 4, 5]),
        ]
    }

    #[test]
    fn test_every_operation_partitions_dataset() {
        let catalog = catalog();
        let covered: HashSet<Operation> = catalog.iter().map(|(c, _)| c.operator()).collect();
        assert_eq!(covered.len(), Operation::ALL.len());

        for (criterion, expected) in catalog {
            assert_eq!(ids(criterion.clone()), expected, "{:?}", criterion);
        }
    }

    #[test]
    fn test_match_examples() {
        let records = vec![
            json!({"id": 1, "name": "Anna"}),
            json!({"id": 2, "name": "banana"}),
            json!({"id": 3, "name": "Bob"}),
            json!({"id": 4, "name": "Hello"}),
        ];
        let mut builder = MemoryCriteriaBuilder::new();
        let root = builder.root();

        let criterion = Criterion::new("name", Operation::Match, "an");
        let an = predicate_for(&root, &criterion, &mut builder).unwrap();
        assert_eq!(ids_matching(&records, &an), vec![1, 2]);

        let he = predicate_for(
            &root,
            &Criterion::new("name", Operation::MatchStart, "he"),
            &mut builder,
        )
        .unwrap();
        assert_eq!(ids_matching(&records, &he), vec![4]);
    }

    #[test]
    fn test_valueless_operations_ignore_value() {
        for op in [
            Operation::EqualNull,
            Operation::NotEqualNull,
            Operation::IsEmpty,
            Operation::IsNotEmpty,
        ] {
            let key = if matches!(op, Operation::IsEmpty | Operation::IsNotEmpty) {
                "tags"
            } else {
                "age"
            };
            let without = ids(Criterion::without_value(key, op));
            assert_eq!(ids(Criterion::new(key, op, "whatever")), without);
            assert_eq!(ids(Criterion::new(key, op, vec![1_i64, 2])), without);
        }
    }

    #[test]
    fn test_in_and_not_in_are_complementary() {
        let sets: Vec<Vec<Scalar>> = vec![
            vec![],
            vec![Scalar::from("Anna")],
            vec![Scalar::from("Bob"), Scalar::from("banana"), Scalar::from("Zed")],
        ];
        let all: Vec<i64> = (1..=5).collect();

        for values in sets {
            let inside = ids(Criterion::new("name", Operation::In, values.clone()));
            let outside = ids(Criterion::new("name", Operation::NotIn, values));
            let mut union: Vec<i64> = inside.iter().chain(outside.iter()).copied().collect();
            union.sort_unstable();
            assert_eq!(union, all);
            assert!(inside.iter().all(|id| !outside.contains(id)));
        }
    }

    #[test]
    fn test_join_keys_need_enough_segments() {
        for (key, op) in [
            ("city", Operation::MatchJoin),
            ("zip", Operation::EqualJoin),
            ("zip", Operation::GreaterThanEqualJoin),
            ("name", Operation::MatchJoinList),
            ("pets.name", Operation::MatchJoinListObject),
        ] {
            let result = select(&[Criterion::new(key, op, "x")]);
            assert!(
                matches!(result, Err(FilterError::InvalidKeyPath { .. })),
                "{} {}",
                key,
                op
            );
        }
    }

    #[test]
    fn test_extra_segments_are_rejected() {
        let result = select(&[Criterion::new("address.city", Operation::Match, "x")]);
        assert!(matches!(result, Err(FilterError::InvalidKeyPath { .. })));
    }

    #[test]
    fn test_date_operations_reject_non_iso_values() {
        for op in [
            Operation::EqualDate,
            Operation::GreaterThanDate,
            Operation::LessThanEqualDate,
        ] {
            let result = select(&[Criterion::new("birthDate", op, "01/01/2000")]);
            assert!(matches!(result, Err(FilterError::InvalidDate { .. })));
        }
    }

    #[test]
    fn test_greater_than_date_is_chronological() {
        let records = vec![
            json!({"id": 1, "birthDate": "2024-06-01T00:00:00"}),
            json!({"id": 2, "birthDate": "2023-01-01T00:00:00"}),
        ];
        let mut builder = MemoryCriteriaBuilder::new();
        let root = builder.root();
        let criterion = Criterion::new(
            "birthDate",
            Operation::GreaterThanDate,
            "2024-01-01T00:00:00",
        );
        let predicate = predicate_for(&root, &criterion, &mut builder).unwrap();
        assert_eq!(ids_matching(&records, &predicate), vec![1]);
    }

    #[test]
    fn test_collection_operations_on_scalar_field() {
        let records = vec![json!({"id": 1, "name": "Anna"}), json!({"id": 2})];
        let mut builder = MemoryCriteriaBuilder::new();
        let root = builder.root();

        let mut run = |criterion: Criterion| {
            let predicate = predicate_for(&root, &criterion, &mut builder).unwrap();
            ids_matching(&records, &predicate)
        };

        // A scalar is neither an empty nor a non-empty collection
        assert_eq!(
            run(Criterion::without_value("name", Operation::IsEmpty)),
            vec![2]
        );
        assert!(run(Criterion::without_value("name", Operation::IsNotEmpty)).is_empty());
        assert!(run(Criterion::new("name", Operation::IsMember, "Anna")).is_empty());
    }

    #[test]
    fn test_combinators() {
        let mut builder = MemoryCriteriaBuilder::new();
        let root = builder.root();
        let anna = Criterion::new("name", Operation::Equal, "Anna");
        let anna = predicate_for(&root, &anna, &mut builder).unwrap();
        let bob = Criterion::new("name", Operation::Equal, "Bob");
        let bob = predicate_for(&root, &bob, &mut builder).unwrap();

        let either = builder.or(vec![anna.clone(), bob]);
        assert_eq!(ids_matching(&people(), &either), vec![1, 3]);

        let not_anna = builder.not(anna);
        assert_eq!(ids_matching(&people(), &not_anna), vec![2, 3, 4, 5]);

        let nothing = builder.or(Vec::new());
        assert!(ids_matching(&people(), &nothing).is_empty());
        let everything = builder.and(Vec::new());
        assert_eq!(ids_matching(&people(), &everything).len(), 5);
    }

    #[test]
    fn test_conjunction_of_criteria() {
        let result = select(&[
            Criterion::new("name", Operation::Match, "an"),
            Criterion::new("address.city", Operation::MatchJoin, "berlin"),
        ])
        .unwrap();
        assert_eq!(result, vec![1, 4]);
    }
}
