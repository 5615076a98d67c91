//! Request document parsing.
//!
//! [`RequestParser`] validates a create/update or relationship document
//! against the generated schema of its resource, then converts it into
//! store-ready [`Fields`]: attributes verbatim, relationship linkage resolved
//! into model instances through the target resource's store.

use hermes_core::schema::{pointer_push, relationship_schema};
use hermes_core::{
    FieldValue, Fields, Instance, JsonApi, JsonApiError, JsonApiResult, Related,
    RelationshipDescriptor, ResourceDescriptor, StoreError, Violation,
};
use serde_json::Value;

/// Result of parsing a resource document.
#[derive(Debug, Clone)]
pub struct ParsedResource {
    /// The client-supplied id, if any.
    pub id: Option<String>,
    /// Fields to write.
    pub fields: Fields,
}

/// Options for [`RequestParser::parse_relationship_object`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkageOptions {
    /// Require the `data` member.
    pub check_full_replacement: bool,
    /// Drop identifiers whose object does not exist instead of failing.
    pub ignore_not_found: bool,
}

impl LinkageOptions {
    /// Adding members to a to-many relationship.
    pub const ADD: Self = Self {
        check_full_replacement: false,
        ignore_not_found: false,
    };

    /// Replacing a relationship.
    pub const REPLACE: Self = Self {
        check_full_replacement: true,
        ignore_not_found: false,
    };

    /// Removing members from a to-many relationship.
    pub const REMOVE: Self = Self {
        check_full_replacement: false,
        ignore_not_found: true,
    };
}

/// Parses request documents for one resource type.
///
/// # Example
///
/// ```
/// use hermes_core::fixtures::fantasy_api;
/// use hermes_core::FieldValue;
/// use hermes_extract::RequestParser;
/// use serde_json::json;
///
/// let api = fantasy_api("http://example.com").unwrap();
/// let books = api.registry().by_type("books").unwrap();
///
/// let parsed = RequestParser::new(&api, books)
///     .parse(
///         &json!({
///             "data": {
///                 "type": "books",
///                 "attributes": {"title": "The Silmarillion"},
///                 "relationships": {"author": {"data": {"type": "authors", "id": "1"}}}
///             }
///         }),
///         None,
///         false,
///     )
///     .unwrap();
///
/// assert!(parsed.id.is_none());
/// assert!(matches!(parsed.fields.get("author"), Some(FieldValue::Relationship(_))));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequestParser<'a> {
    api: &'a JsonApi,
    resource: &'a ResourceDescriptor,
}

impl<'a> RequestParser<'a> {
    /// Creates a parser for `resource`.
    #[must_use]
    pub const fn new(api: &'a JsonApi, resource: &'a ResourceDescriptor) -> Self {
        Self { api, resource }
    }

    /// Parses a resource document.
    ///
    /// `id` is the id from the URL on update; the document must then carry the
    /// same id. With `check_full_replacement`, every declared attribute and
    /// relationship must be present.
    pub fn parse(
        &self,
        document: &Value,
        id: Option<&str>,
        check_full_replacement: bool,
    ) -> JsonApiResult<ParsedResource> {
        let schema = self.api.request_schema(self.resource);
        let violations = schema.validate(document);
        if !violations.is_empty() {
            return Err(JsonApiError::Validation { violations });
        }

        let data = &document["data"];
        let type_name = data["type"].as_str().unwrap_or_default();
        if type_name != self.resource.type_name() {
            return Err(JsonApiError::conflict(
                format!(
                    "type '{type_name}' does not match the endpoint type '{}'",
                    self.resource.type_name()
                ),
                "/data/type",
            ));
        }

        let document_id = data["id"].as_str().map(ToString::to_string);
        if let Some(expected) = id {
            match document_id.as_deref() {
                None => return Err(JsonApiError::validation("/data/id", "missing required member 'id'")),
                Some(actual) if actual != expected => {
                    return Err(JsonApiError::conflict(
                        format!("id '{actual}' does not match the endpoint id '{expected}'"),
                        "/data/id",
                    ));
                }
                Some(_) => {}
            }
        }

        let attributes = data.get("attributes").and_then(Value::as_object);
        let relationships = data.get("relationships").and_then(Value::as_object);

        if check_full_replacement {
            self.check_complete(attributes, relationships)?;
        }

        let mut fields = Fields::new();
        if let Some(attributes) = attributes {
            for name in self.resource.attributes() {
                if let Some(value) = attributes.get(name) {
                    fields.insert(name.clone(), FieldValue::Attribute(value.clone()));
                }
            }
        }
        if let Some(relationships) = relationships {
            for relationship in self.resource.relationships().values() {
                if let Some(entry) = relationships.get(relationship.name()) {
                    let pointer = pointer_push(&pointer_push("/data/relationships", relationship.name()), "data");
                    let related = self.resolve_linkage(relationship, &entry["data"], &pointer, false)?;
                    fields.insert(relationship.name().to_string(), FieldValue::Relationship(related));
                }
            }
        }

        tracing::debug!(
            type_name = self.resource.type_name(),
            id = ?document_id,
            fields = fields.len(),
            "parsed resource document"
        );
        Ok(ParsedResource {
            id: document_id,
            fields,
        })
    }

    fn check_complete(
        &self,
        attributes: Option<&serde_json::Map<String, Value>>,
        relationships: Option<&serde_json::Map<String, Value>>,
    ) -> JsonApiResult<()> {
        let missing_attributes = self
            .resource
            .attributes()
            .iter()
            .filter(|name| !attributes.is_some_and(|a| a.contains_key(name.as_str())))
            .map(|name| (pointer_push("/data/attributes", name), name.as_str()));
        let missing_relationships = self
            .resource
            .relationships()
            .keys()
            .filter(|name| !relationships.is_some_and(|r| r.contains_key(name.as_str())))
            .map(|name| (pointer_push("/data/relationships", name), name.as_str()));

        let violations: Vec<Violation> = missing_attributes
            .chain(missing_relationships)
            .map(|(pointer, name)| {
                Violation::new(pointer, format!("'{name}' is required for a full replacement"))
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(JsonApiError::Validation { violations })
        }
    }

    /// Parses a relationship document (`{"data": linkage}`) located at `pointer`.
    ///
    /// Without `check_full_replacement`, a missing `data` member means no
    /// identifiers.
    pub fn parse_relationship_object(
        &self,
        relationship: &RelationshipDescriptor,
        document: &Value,
        pointer: &str,
        options: LinkageOptions,
    ) -> JsonApiResult<Related> {
        let mut violations = Vec::new();
        relationship_schema(relationship, options.check_full_replacement)
            .validate_at_pointer(document, pointer, &mut violations);
        if !violations.is_empty() {
            return Err(JsonApiError::Validation { violations });
        }

        match document.get("data") {
            Some(linkage) => self.resolve_linkage(
                relationship,
                linkage,
                &pointer_push(pointer, "data"),
                options.ignore_not_found,
            ),
            None if relationship.is_many() => Ok(Related::ToMany(Vec::new())),
            None => Ok(Related::ToOne(None)),
        }
    }

    /// Converts validated linkage into related instances.
    fn resolve_linkage(
        &self,
        relationship: &RelationshipDescriptor,
        linkage: &Value,
        pointer: &str,
        ignore_not_found: bool,
    ) -> JsonApiResult<Related> {
        let target = self.api.registry().by_type(relationship.target_type())?;
        match linkage {
            Value::Array(items) => {
                let mut related = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_pointer = pointer_push(pointer, &index.to_string());
                    if let Some(instance) = self.resolve_identifier(target, item, &item_pointer, ignore_not_found)? {
                        related.push(instance);
                    }
                }
                Ok(Related::ToMany(related))
            }
            Value::Null => Ok(Related::ToOne(None)),
            item => Ok(Related::ToOne(self.resolve_identifier(target, item, pointer, ignore_not_found)?)),
        }
    }

    fn resolve_identifier(
        &self,
        target: &ResourceDescriptor,
        identifier: &Value,
        pointer: &str,
        ignore_not_found: bool,
    ) -> JsonApiResult<Option<Instance>> {
        let type_name = identifier["type"].as_str().unwrap_or_default();
        let id = identifier["id"].as_str().unwrap_or_default();
        if type_name != target.type_name() {
            return Err(JsonApiError::conflict(
                format!("expected type '{}', got '{type_name}'", target.type_name()),
                pointer_push(pointer, "type"),
            ));
        }

        match target.store().fetch_one(target.model(), id) {
            Ok(instance) => Ok(Some(instance)),
            Err(StoreError::ObjectNotFound { .. }) if ignore_not_found => {
                tracing::debug!(type_name, id, "ignoring missing related object");
                Ok(None)
            }
            Err(StoreError::ObjectNotFound { .. }) => {
                Err(JsonApiError::resource_not_found(type_name, id).with_source_pointer(pointer))
            }
            Err(other) => Err(other.into_api_error(target)),
        }
    }
}
