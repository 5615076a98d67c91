//! # Hermes Core
//!
//! Core types and traits for the Hermes JSON:API server binding.
//!
//! This crate provides the foundational types used throughout Hermes:
//!
//! - [`ResourceRegistry`] / [`ResourceDescriptor`] - Declared resource types
//! - [`Store`] / [`Accessor`] - The storage abstraction over opaque model instances
//! - [`Document`] - The JSON:API document model
//! - [`Parameters`] / [`RawParams`] / [`IncludeTree`] - Query parameters
//! - [`PaginationStrategy`] - Page-number and offset-limit pagination
//! - [`LinkBuilder`] - Resource, relationship and pagination links
//! - [`Schema`] / [`SchemaCache`] - Request document schemas
//! - [`JsonApi`] - The configuration object tying it all together
//! - [`JsonApiError`] - Standard error types

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
pub mod document;
mod error;
pub mod fixtures;
mod links;
pub mod pagination;
pub mod params;
mod registry;
pub mod schema;
pub mod store;

pub use api::{JsonApi, JsonApiBuilder};
pub use document::{Document, Linkage, Links, PrimaryData, ResourceIdentifier, ResourceObject};
pub use error::{ErrorDocument, ErrorObject, ErrorSource, JsonApiError, JsonApiResult, Violation};
pub use links::LinkBuilder;
pub use pagination::{
    OffsetLimitStrategy, PageNumberStrategy, Pagination, PaginationStrategy,
};
pub use params::{IncludeTree, Parameters, RawParams, RawValue};
pub use registry::{
    ModelType, RelationshipDescriptor, ResourceDescriptor, ResourceDescriptorBuilder,
    ResourceRegistry,
};
pub use schema::{Schema, SchemaCache};
pub use store::{
    instance, Accessor, FieldValue, Fields, Instance, Related, RelatedIds, Store, StoreError,
    StoreResult,
};
