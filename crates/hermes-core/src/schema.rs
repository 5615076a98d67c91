//! Request document schemas.
//!
//! Request bodies are checked against a [`Schema`] generated from the
//! resource descriptor before any field is read. Validation collects every
//! [`Violation`], each located by a JSON pointer.
//!
//! Generated schemas are memoised per resource type in a [`SchemaCache`].

use crate::error::Violation;
use crate::registry::{RelationshipDescriptor, ResourceDescriptor};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A JSON shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Any value, including `null`.
    Any,
    /// A string.
    String,
    /// `null` or the inner schema.
    Nullable(Box<Schema>),
    /// An array whose items match the inner schema.
    Array(Box<Schema>),
    /// An object.
    Object {
        /// Known members.
        properties: IndexMap<String, Schema>,
        /// Members that must be present.
        required: Vec<String>,
        /// Whether members not in `properties` are accepted.
        additional: bool,
    },
}

impl Schema {
    /// Creates an object schema accepting unknown members.
    #[must_use]
    pub fn object(properties: Vec<(&str, Schema)>, required: &[&str]) -> Self {
        Self::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            required: required.iter().map(ToString::to_string).collect(),
            additional: true,
        }
    }

    /// Rejects members not listed in `properties`.
    #[must_use]
    pub fn closed(self) -> Self {
        match self {
            Self::Object {
                properties,
                required,
                ..
            } => Self::Object {
                properties,
                required,
                additional: false,
            },
            other => other,
        }
    }

    /// Validates `value`, returning every violation found.
    #[must_use]
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.validate_at_pointer(value, "", &mut violations);
        violations
    }

    /// Validates `value` located at `pointer`, appending violations.
    pub fn validate_at_pointer(&self, value: &Value, pointer: &str, out: &mut Vec<Violation>) {
        match self {
            Self::Any => {}
            Self::String => {
                if !value.is_string() {
                    out.push(type_violation(pointer, "string", value));
                }
            }
            Self::Nullable(inner) => {
                if !value.is_null() {
                    inner.validate_at_pointer(value, pointer, out);
                }
            }
            Self::Array(items) => match value.as_array() {
                Some(array) => {
                    for (index, item) in array.iter().enumerate() {
                        items.validate_at_pointer(item, &pointer_push(pointer, &index.to_string()), out);
                    }
                }
                None => out.push(type_violation(pointer, "array", value)),
            },
            Self::Object {
                properties,
                required,
                additional,
            } => {
                let Some(object) = value.as_object() else {
                    out.push(type_violation(pointer, "object", value));
                    return;
                };
                for name in required {
                    if !object.contains_key(name) {
                        out.push(Violation::new(
                            pointer_push(pointer, name),
                            format!("missing required member '{name}'"),
                        ));
                    }
                }
                for (name, member) in object {
                    match properties.get(name) {
                        Some(schema) => {
                            schema.validate_at_pointer(member, &pointer_push(pointer, name), out);
                        }
                        None if !additional => out.push(Violation::new(
                            pointer_push(pointer, name),
                            format!("unknown member '{name}'"),
                        )),
                        None => {}
                    }
                }
            }
        }
    }
}

fn type_violation(pointer: &str, expected: &str, value: &Value) -> Violation {
    Violation::new(
        if pointer.is_empty() { "/" } else { pointer },
        format!("expected {expected}, got {}", value_type_name(value)),
    )
}

/// Returns a human-readable name for a JSON value type.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Appends one reference token to a JSON pointer, escaping `~` and `/`.
#[must_use]
pub fn pointer_push(pointer: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{pointer}/{escaped}")
}

fn identifier_schema() -> Schema {
    Schema::object(vec![("type", Schema::String), ("id", Schema::String)], &["type", "id"])
}

/// Schema of the linkage of one relationship.
#[must_use]
pub fn linkage_schema(relationship: &RelationshipDescriptor) -> Schema {
    if relationship.is_many() {
        Schema::Array(Box::new(identifier_schema()))
    } else {
        Schema::Nullable(Box::new(identifier_schema()))
    }
}

/// Schema of a relationship document (`{"data": linkage}`).
///
/// `data` is only required when `require_data` is set.
#[must_use]
pub fn relationship_schema(relationship: &RelationshipDescriptor, require_data: bool) -> Schema {
    let required: &[&str] = if require_data { &["data"] } else { &[] };
    Schema::object(vec![("data", linkage_schema(relationship))], required)
}

/// Schema of a create/update request document for one resource type.
#[must_use]
pub fn resource_schema(descriptor: &ResourceDescriptor) -> Schema {
    let attributes = Schema::object(
        descriptor
            .attributes()
            .iter()
            .map(|name| (name.as_str(), Schema::Any))
            .collect(),
        &[],
    )
    .closed();

    let relationships = Schema::object(
        descriptor
            .relationships()
            .values()
            .map(|relationship| (relationship.name(), relationship_schema(relationship, true)))
            .collect(),
        &[],
    )
    .closed();

    let data = Schema::object(
        vec![
            ("type", Schema::String),
            ("id", Schema::String),
            ("attributes", attributes),
            ("relationships", relationships),
        ],
        &["type"],
    );

    Schema::object(vec![("data", data)], &["data"])
}

/// Memoised request schemas, keyed by resource type.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the request schema for a type, generating it on first use.
    pub fn get_or_generate(&self, descriptor: &ResourceDescriptor) -> Arc<Schema> {
        if let Some(schema) = self.schemas.read().get(descriptor.type_name()) {
            return Arc::clone(schema);
        }
        let mut schemas = self.schemas.write();
        Arc::clone(
            schemas
                .entry(descriptor.type_name().to_string())
                .or_insert_with(|| {
                    tracing::debug!(type_name = descriptor.type_name(), "generated request schema");
                    Arc::new(resource_schema(descriptor))
                }),
        )
    }

    /// Number of cached schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Returns `true` if nothing has been generated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Book, FantasyStore};
    use crate::registry::ModelType;
    use serde_json::json;

    fn books() -> ResourceDescriptor {
        ResourceDescriptor::builder("books", ModelType::of::<Book>(), Arc::new(FantasyStore::new()))
            .attributes(["title", "date_published"])
            .to_one("author", "authors")
            .to_many("chapters", "chapters")
            .build()
    }

    fn pointers(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.pointer.as_str()).collect()
    }

    #[test]
    fn test_valid_document() {
        let schema = resource_schema(&books());
        let violations = schema.validate(&json!({
            "data": {
                "type": "books",
                "attributes": {"title": "The Silmarillion"},
                "relationships": {
                    "author": {"data": {"type": "authors", "id": "1"}},
                    "chapters": {"data": []}
                }
            }
        }));
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_missing_data_and_type() {
        let schema = resource_schema(&books());
        assert_eq!(pointers(&schema.validate(&json!({}))), ["/data"]);
        assert_eq!(pointers(&schema.validate(&json!({"data": {}}))), ["/data/type"]);
    }

    #[test]
    fn test_unknown_attribute_and_relationship() {
        let schema = resource_schema(&books());
        let violations = schema.validate(&json!({
            "data": {
                "type": "books",
                "attributes": {"isbn": "x"},
                "relationships": {"publisher": {"data": null}}
            }
        }));
        assert_eq!(
            pointers(&violations),
            ["/data/attributes/isbn", "/data/relationships/publisher"]
        );
    }

    #[test]
    fn test_linkage_shapes() {
        let schema = resource_schema(&books());
        let violations = schema.validate(&json!({
            "data": {
                "type": "books",
                "relationships": {
                    "author": {"data": [{"type": "authors", "id": "1"}]},
                    "chapters": {"data": [{"type": "chapters", "id": 5}]}
                }
            }
        }));
        assert_eq!(
            pointers(&violations),
            ["/data/relationships/author/data", "/data/relationships/chapters/data/0/id"]
        );
    }

    #[test]
    fn test_relationship_entry_requires_data() {
        let schema = resource_schema(&books());
        let violations = schema.validate(&json!({
            "data": {"type": "books", "relationships": {"author": {}}}
        }));
        assert_eq!(pointers(&violations), ["/data/relationships/author/data"]);
    }

    #[test]
    fn test_relationship_schema_optional_data() {
        let relationship = RelationshipDescriptor::to_many("chapters", "chapters");
        assert!(relationship_schema(&relationship, false).validate(&json!({})).is_empty());
        assert_eq!(relationship_schema(&relationship, true).validate(&json!({})).len(), 1);
    }

    #[test]
    fn test_non_object_body() {
        let violations = resource_schema(&books()).validate(&json!([1, 2]));
        assert_eq!(violations[0].pointer, "/");
        assert_eq!(violations[0].message, "expected object, got array");
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(pointer_push("/data", "a/b~c"), "/data/a~1b~0c");
    }

    #[test]
    fn test_cache_memoises() {
        let cache = SchemaCache::new();
        let descriptor = books();
        let first = cache.get_or_generate(&descriptor);
        let second = cache.get_or_generate(&descriptor);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
