//! The API configuration object.

use crate::error::JsonApiResult;
use crate::links::LinkBuilder;
use crate::pagination::{PageNumberStrategy, PaginationStrategy};
use crate::registry::{ResourceDescriptor, ResourceRegistry};
use crate::schema::{Schema, SchemaCache};
use std::sync::Arc;

/// Everything the resolver, parser, serializer and controller share: the
/// registry, the link builder, the pagination strategy and the schema cache.
///
/// # Example
///
/// ```
/// use hermes_core::fixtures::fantasy_api;
///
/// let api = fantasy_api("http://example.com").unwrap();
/// assert!(api.registry().get("books").is_some());
/// assert_eq!(api.links().resource("books", "1"), "http://example.com/books/1");
/// ```
#[derive(Debug)]
pub struct JsonApi {
    registry: ResourceRegistry,
    links: LinkBuilder,
    pagination: Arc<dyn PaginationStrategy>,
    schemas: SchemaCache,
}

impl JsonApi {
    /// Starts building an API rooted at `base_url`.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> JsonApiBuilder {
        JsonApiBuilder {
            base_url: base_url.into(),
            resources: Vec::new(),
            pagination: Arc::new(PageNumberStrategy::default()),
        }
    }

    /// The resource registry.
    #[must_use]
    pub const fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The link builder.
    #[must_use]
    pub const fn links(&self) -> &LinkBuilder {
        &self.links
    }

    /// The pagination strategy.
    #[must_use]
    pub fn pagination(&self) -> &dyn PaginationStrategy {
        self.pagination.as_ref()
    }

    /// The request schema of a resource type.
    #[must_use]
    pub fn request_schema(&self, descriptor: &ResourceDescriptor) -> Arc<Schema> {
        self.schemas.get_or_generate(descriptor)
    }
}

/// Builder for [`JsonApi`].
#[must_use]
pub struct JsonApiBuilder {
    base_url: String,
    resources: Vec<ResourceDescriptor>,
    pagination: Arc<dyn PaginationStrategy>,
}

impl JsonApiBuilder {
    /// Adds a resource type.
    pub fn resource(mut self, descriptor: ResourceDescriptor) -> Self {
        self.resources.push(descriptor);
        self
    }

    /// Sets the pagination strategy (page-number, 20/100, by default).
    pub fn pagination(mut self, strategy: impl PaginationStrategy + 'static) -> Self {
        self.pagination = Arc::new(strategy);
        self
    }

    /// Sets a shared pagination strategy.
    pub fn pagination_arc(mut self, strategy: Arc<dyn PaginationStrategy>) -> Self {
        self.pagination = strategy;
        self
    }

    /// Registers every resource and validates the registry.
    pub fn build(self) -> JsonApiResult<JsonApi> {
        let mut registry = ResourceRegistry::new();
        for descriptor in self.resources {
            registry.register(descriptor)?;
        }
        registry.validate()?;
        tracing::info!(
            base_url = %self.base_url,
            resource_types = registry.len(),
            "JSON:API configured"
        );
        Ok(JsonApi {
            registry,
            links: LinkBuilder::new(self.base_url),
            pagination: self.pagination,
            schemas: SchemaCache::new(),
        })
    }
}
