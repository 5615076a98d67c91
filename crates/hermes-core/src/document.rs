//! JSON:API document model.
//!
//! These types are what the serializer produces and what handlers send back.
//! Serialization follows the wire format directly: `type` keys, empty
//! `attributes`/`relationships` omitted, `null` linkage for empty to-one
//! relationships.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document-level links. Pagination links may be `null`.
pub type Links = IndexMap<String, Option<String>>;

/// A `{type, id}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// Resource type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Resource id.
    pub id: String,
}

impl ResourceIdentifier {
    /// Creates an identifier.
    #[must_use]
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}

/// Relationship linkage: `null`, one identifier, or an array of identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    /// To-one linkage.
    ToOne(Option<ResourceIdentifier>),
    /// To-many linkage.
    ToMany(Vec<ResourceIdentifier>),
}

impl Linkage {
    /// Iterates over the linked identifiers.
    pub fn identifiers(&self) -> impl Iterator<Item = &ResourceIdentifier> {
        let slice: &[ResourceIdentifier] = match self {
            Self::ToOne(Some(one)) => std::slice::from_ref(one),
            Self::ToOne(None) => &[],
            Self::ToMany(many) => many,
        };
        slice.iter()
    }
}

/// Links of a resource object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLinks {
    /// Canonical URL of the resource.
    #[serde(rename = "self")]
    pub self_link: String,
}

/// Links of a relationship object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipLinks {
    /// URL of the relationship endpoint.
    #[serde(rename = "self")]
    pub self_link: String,
    /// URL of the related-resource endpoint.
    pub related: String,
}

/// A relationship object inside a resource object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// Relationship links.
    pub links: RelationshipLinks,
    /// Resource linkage.
    pub data: Linkage,
}

/// A JSON:API resource object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    /// Resource type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Resource id.
    pub id: String,
    /// Attribute values, in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
    /// Relationship objects, in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub relationships: IndexMap<String, Relationship>,
    /// Resource links.
    pub links: ResourceLinks,
}

impl ResourceObject {
    /// Returns the `{type, id}` of this object.
    #[must_use]
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(&self.type_name, &self.id)
    }
}

/// The primary `data` member of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// `null`: an empty to-one related resource.
    Null,
    /// A single resource.
    Resource(Box<ResourceObject>),
    /// A list of resources.
    Resources(Vec<ResourceObject>),
    /// A single identifier (to-one relationship endpoint).
    Identifier(ResourceIdentifier),
    /// A list of identifiers (to-many relationship endpoint).
    Identifiers(Vec<ResourceIdentifier>),
}

impl From<Linkage> for PrimaryData {
    fn from(linkage: Linkage) -> Self {
        match linkage {
            Linkage::ToOne(Some(one)) => Self::Identifier(one),
            Linkage::ToOne(None) => Self::Null,
            Linkage::ToMany(many) => Self::Identifiers(many),
        }
    }
}

/// A top-level JSON:API document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Primary data.
    pub data: PrimaryData,
    /// Included resources, in discovery order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
    /// Document-level links.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub links: Links,
}

impl Document {
    /// Creates a document with only primary data.
    #[must_use]
    pub fn new(data: PrimaryData) -> Self {
        Self {
            data,
            included: Vec::new(),
            links: Links::new(),
        }
    }

    /// Replaces the document links.
    #[must_use]
    pub fn with_links(mut self, links: Links) -> Self {
        self.links = links;
        self
    }
}
