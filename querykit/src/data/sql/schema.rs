//! Entity metadata for SQL predicate building
//!
//! Describes which fields of an entity can be filtered, which of them hold
//! collections, and how relations join to other entities. Names coming from
//! criteria are only ever resolved through this metadata, never spliced into
//! SQL directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::filters::FilterError;
use crate::utils::sql::is_safe_identifier;

/// Cardinality of a relation as seen from the owning entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ToOne,
    ToMany,
}

/// A filterable field
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Field {
    /// Column name when it differs from the field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Column stores a collection (JSON array in SQLite, array in PostgreSQL)
    #[serde(default)]
    pub collection: bool,
}

/// Join from one entity to another
///
/// Rendered as `INNER JOIN <target table> AS <alias> ON <alias>.<target_column>
/// = <from alias>.<local_column>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Relation {
    pub target: String,
    pub kind: RelationKind,
    pub local_column: String,
    pub target_column: String,
}

impl Relation {
    /// Many-to-one: `local_column` is the foreign key on the owning table
    pub fn to_one(target: &str, local_column: &str, target_column: &str) -> Self {
        Self {
            target: target.to_string(),
            kind: RelationKind::ToOne,
            local_column: local_column.to_string(),
            target_column: target_column.to_string(),
        }
    }

    /// One-to-many: `target_column` is the foreign key on the target table
    pub fn to_many(target: &str, local_column: &str, target_column: &str) -> Self {
        Self {
            target: target.to_string(),
            kind: RelationKind::ToMany,
            local_column: local_column.to_string(),
            target_column: target_column.to_string(),
        }
    }
}

/// Table, fields and relations of one entity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntitySchema {
    pub table: String,
    #[serde(default)]
    pub fields: HashMap<String, Field>,
    #[serde(default)]
    pub relations: HashMap<String, Relation>,
}

impl EntitySchema {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            fields: HashMap::new(),
            relations: HashMap::new(),
        }
    }

    /// Add a scalar field stored in a column of the same name
    pub fn field(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string(), Field::default());
        self
    }

    /// Add a scalar field stored in a differently named column
    pub fn field_as(mut self, name: &str, column: &str) -> Self {
        self.fields.insert(
            name.to_string(),
            Field {
                column: Some(column.to_string()),
                collection: false,
            },
        );
        self
    }

    /// Add a collection-valued field
    pub fn collection(mut self, name: &str) -> Self {
        self.fields.insert(
            name.to_string(),
            Field {
                column: None,
                collection: true,
            },
        );
        self
    }

    pub fn relation(mut self, name: &str, relation: Relation) -> Self {
        self.relations.insert(name.to_string(), relation);
        self
    }

    /// Column backing `name`
    pub fn column<'a>(&'a self, name: &'a str) -> Option<(&'a str, &'a Field)> {
        self.fields
            .get(name)
            .map(|f| (f.column.as_deref().unwrap_or(name), f))
    }
}

/// Metadata for every entity that can be filtered
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Schema {
    #[serde(default)]
    pub entities: HashMap<String, EntitySchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, name: &str, entity: EntitySchema) -> Self {
        self.entities.insert(name.to_string(), entity);
        self
    }

    pub fn get(&self, name: &str) -> Result<&EntitySchema, FilterError> {
        self.entities
            .get(name)
            .ok_or_else(|| FilterError::UnknownEntity(name.to_string()))
    }

    /// Parse and validate a schema document
    pub fn from_json(json_str: &str) -> Result<Self, FilterError> {
        let schema: Self =
            serde_json::from_str(json_str).map_err(|e| FilterError::InvalidJson(e.to_string()))?;
        schema.validate()?;
        tracing::debug!(entities = schema.entities.len(), "Loaded schema");
        Ok(schema)
    }

    /// Check identifiers and relation targets
    ///
    /// Every table and column name must be a plain identifier and every
    /// relation must point at a known entity.
    pub fn validate(&self) -> Result<(), FilterError> {
        for (name, entity) in &self.entities {
            if !is_safe_identifier(&entity.table) {
                return Err(FilterError::UnknownEntity(format!(
                    "{} (table '{}')",
                    name, entity.table
                )));
            }

            for field in entity.fields.keys() {
                let Some((column, _)) = entity.column(field) else {
                    continue;
                };
                if !is_safe_identifier(column) {
                    return Err(FilterError::UnknownField {
                        entity: name.clone(),
                        field: field.clone(),
                    });
                }
            }

            for (relation_name, relation) in &entity.relations {
                let target_known = self.entities.contains_key(&relation.target);
                let columns_safe = is_safe_identifier(&relation.local_column)
                    && is_safe_identifier(&relation.target_column);
                if !target_known || !columns_safe {
                    return Err(FilterError::UnknownRelation {
                        entity: name.clone(),
                        relation: relation_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// person ─< pet, person >─ address, pet >─ address
    pub fn people() -> Schema {
        Schema::new()
            .entity(
                "person",
                EntitySchema::new("people")
                    .field("id")
                    .field("name")
                    .field("age")
                    .field_as("birthDate", "birth_date")
                    .collection("tags")
                    .relation("address", Relation::to_one("address", "address_id", "id"))
                    .relation("pets", Relation::to_many("pet", "id", "owner_id")),
            )
            .entity(
                "pet",
                EntitySchema::new("pets")
                    .field("id")
                    .field("name")
                    .relation("vet", Relation::to_one("address", "vet_address_id", "id")),
            )
            .entity(
                "address",
                EntitySchema::new("addresses")
                    .field("id")
                    .field("city")
                    .field("zip"),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_mapping() {
        let schema = fixtures::people();
        let person = schema.get("person").unwrap();
        assert_eq!(person.column("birthDate").unwrap().0, "birth_date");
        assert_eq!(person.column("name").unwrap().0, "name");
        assert!(person.column("tags").unwrap().1.collection);
        assert!(person.column("salary").is_none());
    }

    #[test]
    fn test_unknown_entity() {
        let schema = fixtures::people();
        assert!(matches!(
            schema.get("ghost"),
            Err(FilterError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_fixture_is_valid() {
        assert!(fixtures::people().validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "entities": {
                "person": {
                    "table": "people",
                    "fields": {
                        "name": {},
                        "birthDate": {"column": "birth_date"},
                        "tags": {"collection": true}
                    },
                    "relations": {
                        "address": {
                            "target": "address",
                            "kind": "to_one",
                            "local_column": "address_id",
                            "target_column": "id"
                        }
                    }
                },
                "address": {"table": "addresses", "fields": {"city": {}}}
            }
        }"#;
        let schema = Schema::from_json(json).unwrap();
        let person = schema.get("person").unwrap();
        assert_eq!(person.relations["address"].kind, RelationKind::ToOne);
        assert!(person.fields["tags"].collection);
    }

    #[test]
    fn test_rejects_unsafe_column() {
        let schema =
            Schema::new().entity("person", EntitySchema::new("people").field_as("name", "x; --"));
        assert!(matches!(
            schema.validate(),
            Err(FilterError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_rejects_dangling_relation() {
        let schema = Schema::new().entity(
            "person",
            EntitySchema::new("people").relation("boss", Relation::to_one("manager", "boss_id", "id")),
        );
        assert!(matches!(
            schema.validate(),
            Err(FilterError::UnknownRelation { .. })
        ));
    }
}
