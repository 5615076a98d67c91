//! Resource registry.
//!
//! A [`ResourceDescriptor`] declares one JSON:API resource type: its name, the
//! model backing it, its attributes and relationships, and the [`Store`] that
//! serves it. The [`ResourceRegistry`] indexes descriptors by type name and by
//! model.
//!
//! # Example
//!
//! ```
//! use hermes_core::fixtures::{Author, Book, FantasyStore};
//! use hermes_core::{ModelType, ResourceDescriptor, ResourceRegistry};
//! use std::sync::Arc;
//!
//! let store = Arc::new(FantasyStore::new());
//! let mut registry = ResourceRegistry::new();
//! registry
//!     .register(
//!         ResourceDescriptor::builder("authors", ModelType::of::<Author>(), store.clone())
//!             .attribute("name")
//!             .to_many("books", "books")
//!             .build(),
//!     )
//!     .unwrap();
//! registry
//!     .register(
//!         ResourceDescriptor::builder("books", ModelType::of::<Book>(), store)
//!             .attribute("title")
//!             .to_one("author", "authors")
//!             .build(),
//!     )
//!     .unwrap();
//! registry.validate().unwrap();
//!
//! assert_eq!(registry.by_model(&ModelType::of::<Book>()).unwrap().type_name(), "books");
//! ```

use crate::error::{JsonApiError, JsonApiResult};
use crate::store::{Instance, Store};
use indexmap::{IndexMap, IndexSet};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifies a concrete model type.
#[derive(Debug, Clone, Copy)]
pub struct ModelType {
    id: TypeId,
    name: &'static str,
}

impl ModelType {
    /// Returns the model type of `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// The underlying `TypeId`.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.id
    }

    /// The unqualified Rust type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if `instance` is a value of this model.
    #[must_use]
    pub fn matches(&self, instance: &Instance) -> bool {
        instance_type_id(instance) == self.id
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelType {}

impl Hash for ModelType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// `TypeId` of the value behind an instance, not of the `Arc` holding it.
fn instance_type_id(instance: &Instance) -> TypeId {
    (**instance).type_id()
}

fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

/// A relationship declared on a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    name: String,
    target_type: String,
    many: bool,
}

impl RelationshipDescriptor {
    /// Declares a to-one relationship.
    #[must_use]
    pub fn to_one(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            many: false,
        }
    }

    /// Declares a to-many relationship.
    #[must_use]
    pub fn to_many(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            many: true,
        }
    }

    /// Relationship name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource type of the related objects.
    #[must_use]
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Returns `true` for to-many relationships.
    #[must_use]
    pub const fn is_many(&self) -> bool {
        self.many
    }
}

/// Declaration of one resource type.
#[derive(Clone)]
pub struct ResourceDescriptor {
    type_name: String,
    model: ModelType,
    attributes: IndexSet<String>,
    relationships: IndexMap<String, RelationshipDescriptor>,
    store: Arc<dyn Store>,
}

impl ResourceDescriptor {
    /// Starts building a descriptor.
    #[must_use]
    pub fn builder(
        type_name: impl Into<String>,
        model: ModelType,
        store: Arc<dyn Store>,
    ) -> ResourceDescriptorBuilder {
        ResourceDescriptorBuilder {
            type_name: type_name.into(),
            model,
            attributes: IndexSet::new(),
            relationships: IndexMap::new(),
            store,
        }
    }

    /// The resource type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The backing model.
    #[must_use]
    pub const fn model(&self) -> &ModelType {
        &self.model
    }

    /// Declared attribute names, in declaration order.
    #[must_use]
    pub const fn attributes(&self) -> &IndexSet<String> {
        &self.attributes
    }

    /// Declared relationships, in declaration order.
    #[must_use]
    pub const fn relationships(&self) -> &IndexMap<String, RelationshipDescriptor> {
        &self.relationships
    }

    /// Looks up a relationship by name.
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.get(name)
    }

    /// Looks up a relationship, failing with `RelationshipNotFound`.
    pub fn require_relationship(&self, name: &str) -> JsonApiResult<&RelationshipDescriptor> {
        self.relationship(name)
            .ok_or_else(|| JsonApiError::relationship_not_found(&self.type_name, name))
    }

    /// Returns `true` if `name` is a declared attribute or relationship.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.attributes.contains(name) || self.relationships.contains_key(name)
    }

    /// The store backing this type.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("type_name", &self.type_name)
            .field("model", &self.model.name())
            .field("attributes", &self.attributes)
            .field("relationships", &self.relationships)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResourceDescriptor`].
#[must_use]
pub struct ResourceDescriptorBuilder {
    type_name: String,
    model: ModelType,
    attributes: IndexSet<String>,
    relationships: IndexMap<String, RelationshipDescriptor>,
    store: Arc<dyn Store>,
}

impl ResourceDescriptorBuilder {
    /// Declares an attribute.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into());
        self
    }

    /// Declares several attributes.
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares a to-one relationship.
    pub fn to_one(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.relationship(RelationshipDescriptor::to_one(name, target_type))
    }

    /// Declares a to-many relationship.
    pub fn to_many(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.relationship(RelationshipDescriptor::to_many(name, target_type))
    }

    /// Declares a relationship.
    pub fn relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.relationships
            .insert(relationship.name.clone(), relationship);
        self
    }

    /// Builds the descriptor.
    #[must_use]
    pub fn build(self) -> ResourceDescriptor {
        ResourceDescriptor {
            type_name: self.type_name,
            model: self.model,
            attributes: self.attributes,
            relationships: self.relationships,
            store: self.store,
        }
    }
}

/// Registry of resource types.
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    by_type: IndexMap<String, Arc<ResourceDescriptor>>,
    by_model: HashMap<TypeId, String>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor.
    ///
    /// Fails with `DuplicateType` if the type name is taken, and with an
    /// internal error if the model already backs another type.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> JsonApiResult<()> {
        if self.by_type.contains_key(descriptor.type_name()) {
            return Err(JsonApiError::DuplicateType {
                type_name: descriptor.type_name,
            });
        }
        if let Some(existing) = self.by_model.get(&descriptor.model.type_id()) {
            return Err(JsonApiError::internal(format!(
                "model {} already backs resource type '{existing}'",
                descriptor.model.name()
            )));
        }

        tracing::debug!(
            type_name = %descriptor.type_name,
            model = descriptor.model.name(),
            attributes = descriptor.attributes.len(),
            relationships = descriptor.relationships.len(),
            "registered resource type"
        );
        self.by_model
            .insert(descriptor.model.type_id(), descriptor.type_name.clone());
        self.by_type
            .insert(descriptor.type_name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Checks that every relationship targets a registered type and that no
    /// field name is both an attribute and a relationship.
    pub fn validate(&self) -> JsonApiResult<()> {
        for descriptor in self.by_type.values() {
            for relationship in descriptor.relationships.values() {
                if !self.by_type.contains_key(relationship.target_type()) {
                    return Err(JsonApiError::internal(format!(
                        "relationship '{}.{}' targets unregistered type '{}'",
                        descriptor.type_name,
                        relationship.name(),
                        relationship.target_type()
                    )));
                }
                if descriptor.attributes.contains(relationship.name()) {
                    return Err(JsonApiError::internal(format!(
                        "'{}.{}' is declared as both an attribute and a relationship",
                        descriptor.type_name,
                        relationship.name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Looks up a descriptor by type name.
    pub fn by_type(&self, type_name: &str) -> JsonApiResult<&ResourceDescriptor> {
        self.get(type_name)
            .ok_or_else(|| JsonApiError::resource_type_not_found(type_name))
    }

    /// Looks up a descriptor by type name, returning `None` when absent.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&ResourceDescriptor> {
        self.by_type.get(type_name).map(AsRef::as_ref)
    }

    /// Looks up the descriptor backed by a model.
    pub fn by_model(&self, model: &ModelType) -> JsonApiResult<&ResourceDescriptor> {
        self.lookup_model(model.type_id(), model.name())
    }

    /// Looks up the descriptor for an instance's model.
    pub fn by_instance(&self, instance: &Instance) -> JsonApiResult<&ResourceDescriptor> {
        self.lookup_model(instance_type_id(instance), "unregistered model")
    }

    fn lookup_model(&self, type_id: TypeId, name: &str) -> JsonApiResult<&ResourceDescriptor> {
        self.by_model
            .get(&type_id)
            .and_then(|type_name| self.get(type_name))
            .ok_or_else(|| JsonApiError::ResourceNotFound {
                type_name: name.to_string(),
                id: None,
                source_pointer: None,
            })
    }

    /// Iterates over descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.by_type.values().map(AsRef::as_ref)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
