//! Storage abstraction.
//!
//! Hermes never touches a database itself. Each registered resource type is
//! backed by a [`Store`], which knows how to read fields off opaque model
//! instances ([`Accessor`]) and how to fetch and mutate them.
//!
//! Instances are handed around as [`Instance`], a shared `dyn Any`. A store
//! downcasts them to its concrete model types.

use crate::error::JsonApiError;
use crate::pagination::Pagination;
use crate::registry::ResourceDescriptor;
use crate::schema::pointer_push;
use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// An opaque, shareable model instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps a model value as an [`Instance`].
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`Store`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// No object with this id exists.
    #[error("{model} '{id}' does not exist")]
    ObjectNotFound {
        /// Model name.
        model: &'static str,
        /// Requested id.
        id: String,
    },

    /// An object with this id already exists.
    #[error("{model} '{id}' already exists")]
    ObjectAlreadyExists {
        /// Model name.
        model: &'static str,
        /// Conflicting id.
        id: String,
    },

    /// The model has no such attribute or relationship.
    #[error("{model} has no field '{field}'")]
    UnknownField {
        /// Model name.
        model: &'static str,
        /// Requested field.
        field: String,
    },

    /// A field value cannot be stored.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What is wrong with the value.
        message: String,
    },

    /// The instance is not of a model this store handles.
    #[error("instance is not a model handled by this store")]
    UnsupportedModel,

    /// Any other backend failure.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Translates a store failure on `resource` into a [`JsonApiError`].
    ///
    /// Missing and duplicate objects keep their id; invalid values point at
    /// the offending request-body member; everything else is internal.
    pub fn into_api_error(self, resource: &ResourceDescriptor) -> JsonApiError {
        let type_name = resource.type_name();
        match self {
            Self::ObjectNotFound { id, .. } => JsonApiError::resource_not_found(type_name, id),
            Self::ObjectAlreadyExists { id, .. } => JsonApiError::ResourceAlreadyExists {
                type_name: type_name.to_string(),
                id,
            },
            Self::InvalidValue { field, message } => {
                let pointer = if field == "id" {
                    "/data/id".to_string()
                } else if resource.relationship(&field).is_some() {
                    pointer_push("/data/relationships", &field)
                } else {
                    pointer_push("/data/attributes", &field)
                };
                JsonApiError::validation(pointer, message)
            }
            other => JsonApiError::internal_with_source(
                format!("store failure on resource type '{type_name}'"),
                other,
            ),
        }
    }
}

/// Related objects of one relationship.
#[derive(Clone)]
pub enum Related {
    /// At most one related object.
    ToOne(Option<Instance>),
    /// An ordered collection of related objects.
    ToMany(Vec<Instance>),
}

impl Related {
    /// Iterates over the related objects.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        let slice: &[Instance] = match self {
            Self::ToOne(Some(one)) => std::slice::from_ref(one),
            Self::ToOne(None) => &[],
            Self::ToMany(many) => many,
        };
        slice.iter()
    }

    /// Number of related objects.
    pub fn len(&self) -> usize {
        match self {
            Self::ToOne(one) => usize::from(one.is_some()),
            Self::ToMany(many) => many.len(),
        }
    }

    /// Returns `true` when there is no related object.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the value into a plain list.
    pub fn into_vec(self) -> Vec<Instance> {
        match self {
            Self::ToOne(one) => one.into_iter().collect(),
            Self::ToMany(many) => many,
        }
    }
}

impl std::fmt::Debug for Related {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToOne(one) => write!(f, "ToOne({})", if one.is_some() { "Some(..)" } else { "None" }),
            Self::ToMany(many) => write!(f, "ToMany(len={})", many.len()),
        }
    }
}

/// Identifiers of the related objects of one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelatedIds {
    /// At most one id.
    ToOne(Option<String>),
    /// An ordered list of ids.
    ToMany(Vec<String>),
}

/// A field value parsed from a request document.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A raw attribute value.
    Attribute(Value),
    /// Resolved related objects.
    Relationship(Related),
}

/// Fields to write on create or update, keyed by field name.
pub type Fields = IndexMap<String, FieldValue>;

/// Reads identity and fields off model instances.
pub trait Accessor: Send + Sync {
    /// Returns the instance id as a string.
    fn id(&self, instance: &Instance) -> StoreResult<String>;

    /// Reads an attribute value.
    fn attribute(&self, instance: &Instance, name: &str) -> StoreResult<Value>;

    /// Reads the ids of related objects.
    fn related_ids(&self, instance: &Instance, relationship: &str) -> StoreResult<RelatedIds>;

    /// Reads the related objects themselves.
    fn related(&self, instance: &Instance, relationship: &str) -> StoreResult<Related>;
}

/// Fetches and mutates model instances for one or more resource types.
///
/// `model` arguments name the concrete model by its [`ModelType`](crate::ModelType).
pub trait Store: Accessor {
    /// Fetches one object, failing with [`StoreError::ObjectNotFound`].
    fn fetch_one(&self, model: &crate::ModelType, id: &str) -> StoreResult<Instance>;

    /// Fetches a (possibly paginated) list of objects.
    fn fetch_many(
        &self,
        model: &crate::ModelType,
        pagination: Option<&Pagination>,
    ) -> StoreResult<Vec<Instance>>;

    /// Counts all objects of a model.
    fn count(&self, model: &crate::ModelType) -> StoreResult<usize>;

    /// Fetches the related objects of one relationship, paginating to-many results.
    fn fetch_related(
        &self,
        instance: &Instance,
        relationship: &str,
        pagination: Option<&Pagination>,
    ) -> StoreResult<Related> {
        let related = self.related(instance, relationship)?;
        Ok(match (related, pagination) {
            (Related::ToMany(many), Some(page)) => {
                Related::ToMany(many.into_iter().skip(page.offset()).take(page.limit()).collect())
            }
            (related, _) => related,
        })
    }

    /// Counts the related objects of one relationship.
    fn count_related(&self, instance: &Instance, relationship: &str) -> StoreResult<usize> {
        Ok(self.related(instance, relationship)?.len())
    }

    /// Creates an object, failing with [`StoreError::ObjectAlreadyExists`]
    /// when a client-supplied id is taken.
    fn create(
        &self,
        model: &crate::ModelType,
        id: Option<&str>,
        fields: Fields,
    ) -> StoreResult<Instance>;

    /// Updates an object and returns its new state.
    fn update(&self, instance: &Instance, fields: Fields) -> StoreResult<Instance>;

    /// Adds objects to a to-many relationship.
    fn create_relationship(
        &self,
        instance: &Instance,
        relationship: &str,
        values: Vec<Instance>,
    ) -> StoreResult<()>;

    /// Replaces the contents of a relationship.
    fn update_relationship(
        &self,
        instance: &Instance,
        relationship: &str,
        value: Related,
    ) -> StoreResult<()> {
        let mut fields = Fields::new();
        fields.insert(relationship.to_string(), FieldValue::Relationship(value));
        self.update(instance, fields).map(|_| ())
    }

    /// Removes objects from a to-many relationship.
    fn delete_relationship(
        &self,
        instance: &Instance,
        relationship: &str,
        values: Vec<Instance>,
    ) -> StoreResult<()>;
}
