//! SQL predicate builder
//!
//! Implements [`CriteriaBuilder`] by emitting parameterised WHERE fragments.
//! Field and relation names are resolved through [`Schema`]; every value is
//! bound as a parameter. Joins are collected on the builder and rendered as
//! `INNER JOIN` clauses by [`SelectQuery`].

use crate::data::filters::{CriteriaBuilder, FilterError, Scalar};

use super::Backend;
use super::query::SelectQuery;
use super::schema::{EntitySchema, RelationKind, Schema};

/// Alias of the query root table
pub const ROOT_ALIAS: &str = "r";

/// Position in the query: an entity (root or join target) or one of its columns
#[derive(Debug, Clone, PartialEq)]
pub enum SqlPath {
    Entity {
        entity: String,
        alias: String,
    },
    Column {
        entity: String,
        field: String,
        expr: String,
        collection: bool,
    },
}

impl SqlPath {
    /// SQL expression for the path
    pub fn expr(&self) -> &str {
        match self {
            Self::Entity { alias, .. } => alias,
            Self::Column { expr, .. } => expr,
        }
    }
}

/// WHERE fragment with `?` placeholders and its parameters in textual order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub sql: String,
    pub params: Vec<Scalar>,
}

impl SqlPredicate {
    fn literal(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            params: Vec::new(),
        }
    }

    fn new(sql: String, params: Vec<Scalar>) -> Self {
        Self { sql, params }
    }
}

/// Builds predicates and joins for one root entity
pub struct SqlCriteriaBuilder<'s> {
    schema: &'s Schema,
    backend: Backend,
    root: &'s EntitySchema,
    entity: String,
    joins: Vec<String>,
}

impl<'s> SqlCriteriaBuilder<'s> {
    pub fn new(schema: &'s Schema, backend: Backend, entity: &str) -> Result<Self, FilterError> {
        let root = schema.get(entity)?;
        Ok(Self {
            schema,
            backend,
            root,
            entity: entity.to_string(),
            joins: Vec::new(),
        })
    }

    /// Path of the query root
    pub fn root(&self) -> SqlPath {
        SqlPath::Entity {
            entity: self.entity.clone(),
            alias: ROOT_ALIAS.to_string(),
        }
    }

    /// JOIN clauses added so far
    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    /// Finish building and wrap `predicate` in a full SELECT
    pub fn into_query(self, predicate: SqlPredicate) -> SelectQuery {
        SelectQuery::new(self.backend, &self.root.table, self.joins, predicate)
    }

    fn entity_of<'p>(
        from: &'p SqlPath,
        name: &str,
    ) -> Result<(&'p str, &'p str), FilterError> {
        match from {
            SqlPath::Entity { entity, alias } => Ok((entity, alias)),
            SqlPath::Column { entity, field, .. } => Err(FilterError::UnknownRelation {
                entity: format!("{}.{}", entity, field),
                relation: name.to_string(),
            }),
        }
    }

    fn join_relation(
        &mut self,
        from: &SqlPath,
        relation: &str,
        require_many: bool,
    ) -> Result<SqlPath, FilterError> {
        let schema = self.schema;
        let (entity, from_alias) = Self::entity_of(from, relation)?;
        let source = schema.get(entity)?;
        let rel = source
            .relations
            .get(relation)
            .ok_or_else(|| FilterError::UnknownRelation {
                entity: entity.to_string(),
                relation: relation.to_string(),
            })?;

        if require_many && rel.kind != RelationKind::ToMany {
            return Err(FilterError::NotACollection {
                entity: entity.to_string(),
                name: relation.to_string(),
            });
        }

        let target = schema.get(&rel.target)?;
        let alias = format!("j{}", self.joins.len() + 1);
        self.joins.push(format!(
            "INNER JOIN {} AS {} ON {}.{} = {}.{}",
            target.table, alias, alias, rel.target_column, from_alias, rel.local_column
        ));

        tracing::trace!(
            from = entity,
            relation,
            alias = %alias,
            "Added filter join"
        );

        Ok(SqlPath::Entity {
            entity: rel.target.clone(),
            alias,
        })
    }

    fn compare(path: SqlPath, op: &str, value: &Scalar) -> SqlPredicate {
        SqlPredicate::new(format!("{} {} ?", path.expr(), op), vec![value.clone()])
    }

    fn collection_expr(path: &SqlPath) -> Result<String, FilterError> {
        match path {
            SqlPath::Column {
                expr,
                collection: true,
                ..
            } => Ok(expr.clone()),
            SqlPath::Column { entity, field, .. } => Err(FilterError::NotACollection {
                entity: entity.clone(),
                name: field.clone(),
            }),
            SqlPath::Entity { entity, alias } => Err(FilterError::NotACollection {
                entity: entity.clone(),
                name: alias.clone(),
            }),
        }
    }

    fn placeholders(count: usize) -> String {
        vec!["?"; count].join(", ")
    }
}

impl CriteriaBuilder for SqlCriteriaBuilder<'_> {
    type Path = SqlPath;
    type Predicate = SqlPredicate;

    fn get(&mut self, from: &SqlPath, name: &str) -> Result<SqlPath, FilterError> {
        let (entity, alias) = match from {
            SqlPath::Entity { entity, alias } => (entity, alias),
            SqlPath::Column { entity, field, .. } => {
                return Err(FilterError::UnknownField {
                    entity: format!("{}.{}", entity, field),
                    field: name.to_string(),
                });
            }
        };
        let schema = self.schema.get(entity)?;
        let (column, field) = schema
            .column(name)
            .ok_or_else(|| FilterError::UnknownField {
                entity: entity.clone(),
                field: name.to_string(),
            })?;

        Ok(SqlPath::Column {
            entity: entity.clone(),
            field: name.to_string(),
            expr: format!("{}.{}", alias, column),
            collection: field.collection,
        })
    }

    fn join(&mut self, from: &SqlPath, relation: &str) -> Result<SqlPath, FilterError> {
        self.join_relation(from, relation, false)
    }

    fn join_list(&mut self, from: &SqlPath, relation: &str) -> Result<SqlPath, FilterError> {
        self.join_relation(from, relation, true)
    }

    fn lower(&mut self, path: SqlPath) -> SqlPath {
        match path {
            SqlPath::Column {
                entity,
                field,
                expr,
                collection,
            } => SqlPath::Column {
                entity,
                field,
                expr: format!("LOWER({})", expr),
                collection,
            },
            entity => entity,
        }
    }

    fn equal(&mut self, path: SqlPath, value: &Scalar) -> SqlPredicate {
        Self::compare(path, "=", value)
    }

    fn not_equal(&mut self, path: SqlPath, value: &Scalar) -> SqlPredicate {
        Self::compare(path, "<>", value)
    }

    fn greater_than(&mut self, path: SqlPath, value: &Scalar) -> SqlPredicate {
        Self::compare(path, ">", value)
    }

    fn less_than(&mut self, path: SqlPath, value: &Scalar) -> SqlPredicate {
        Self::compare(path, "<", value)
    }

    fn greater_than_or_equal(&mut self, path: SqlPath, value: &Scalar) -> SqlPredicate {
        Self::compare(path, ">=", value)
    }

    fn less_than_or_equal(&mut self, path: SqlPath, value: &Scalar) -> SqlPredicate {
        Self::compare(path, "<=", value)
    }

    fn like(&mut self, path: SqlPath, pattern: &str) -> SqlPredicate {
        SqlPredicate::new(
            format!("{} LIKE ? ESCAPE '\\'", path.expr()),
            vec![Scalar::from(pattern)],
        )
    }

    fn is_null(&mut self, path: SqlPath) -> SqlPredicate {
        SqlPredicate::literal(&format!("{} IS NULL", path.expr()))
    }

    fn is_not_null(&mut self, path: SqlPath) -> SqlPredicate {
        SqlPredicate::literal(&format!("{} IS NOT NULL", path.expr()))
    }

    fn is_member(
        &mut self,
        value: &Scalar,
        collection: SqlPath,
    ) -> Result<SqlPredicate, FilterError> {
        let expr = Self::collection_expr(&collection)?;
        Ok(SqlPredicate::new(
            self.backend.dialect().array_contains(&expr),
            vec![value.clone()],
        ))
    }

    fn in_list(&mut self, path: SqlPath, values: &[Scalar]) -> SqlPredicate {
        if values.is_empty() {
            return SqlPredicate::literal("1=0");
        }
        SqlPredicate::new(
            format!("{} IN ({})", path.expr(), Self::placeholders(values.len())),
            values.to_vec(),
        )
    }

    fn not_in_list(&mut self, path: SqlPath, values: &[Scalar]) -> SqlPredicate {
        if values.is_empty() {
            return SqlPredicate::literal("1=1");
        }
        let expr = path.expr();
        SqlPredicate::new(
            format!(
                "({} IS NULL OR {} NOT IN ({}))",
                expr,
                expr,
                Self::placeholders(values.len())
            ),
            values.to_vec(),
        )
    }

    fn is_empty(&mut self, collection: SqlPath) -> Result<SqlPredicate, FilterError> {
        let expr = Self::collection_expr(&collection)?;
        Ok(SqlPredicate::literal(&format!(
            "{} = 0",
            self.backend.dialect().array_length(&expr)
        )))
    }

    fn is_not_empty(&mut self, collection: SqlPath) -> Result<SqlPredicate, FilterError> {
        let expr = Self::collection_expr(&collection)?;
        Ok(SqlPredicate::literal(&format!(
            "{} > 0",
            self.backend.dialect().array_length(&expr)
        )))
    }

    fn and(&mut self, predicates: Vec<SqlPredicate>) -> SqlPredicate {
        combine(predicates, " AND ", "1=1")
    }

    fn or(&mut self, predicates: Vec<SqlPredicate>) -> SqlPredicate {
        combine(predicates, " OR ", "1=0")
    }

    fn not(&mut self, predicate: SqlPredicate) -> SqlPredicate {
        SqlPredicate::new(format!("NOT ({})", predicate.sql), predicate.params)
    }
}

fn combine(mut predicates: Vec<SqlPredicate>, separator: &str, empty: &str) -> SqlPredicate {
    if predicates.len() <= 1 {
        return predicates
            .pop()
            .unwrap_or_else(|| SqlPredicate::literal(empty));
    }

    let mut parts = Vec::with_capacity(predicates.len());
    let mut params = Vec::new();
    for predicate in predicates {
        parts.push(predicate.sql);
        params.extend(predicate.params);
    }
    SqlPredicate::new(format!("({})", parts.join(separator)), params)
}
