//! The JSON:API controller.
//!
//! One method per endpoint operation. Each resolves query parameters before
//! touching the store, so a malformed `include` or `fields` never causes a
//! repository call. Results are [`Outcome`]s; turning errors into responses
//! is left to [`App`](crate::App).

use hermes_core::{
    Document, Instance, JsonApi, JsonApiError, JsonApiResult, Parameters, RawParams, Related,
    RelationshipDescriptor, ResourceDescriptor,
};
use hermes_extract::{LinkageOptions, ParameterPolicy, ParameterResolver, RequestParser};
use hermes_serializer::Serializer;
use serde_json::Value;

use crate::response::{self, JsonApiResponse};
use crate::routes::{Operation, Route};

/// Result of a successful controller operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `200 OK` with a document.
    Document(Document),
    /// `201 Created` with a document and the new resource's URL.
    Created {
        /// The created resource.
        document: Document,
        /// Its `self` link.
        location: String,
    },
    /// `204 No Content`.
    NoContent,
}

impl Outcome {
    /// Converts the outcome into an HTTP response.
    #[must_use]
    pub fn into_response(self) -> JsonApiResponse {
        match self {
            Self::Document(document) => response::ok(&document),
            Self::Created { document, location } => response::created(&document, &location),
            Self::NoContent => response::no_content(),
        }
    }
}

/// Dispatches operations against a [`JsonApi`].
///
/// # Example
///
/// ```
/// use hermes_core::fixtures::fantasy_api;
/// use hermes_core::RawParams;
/// use hermes_server::{Controller, Outcome};
///
/// let api = fantasy_api("http://example.com").unwrap();
/// let outcome = Controller::new(&api)
///     .fetch_resource("books", "11", RawParams::new())
///     .unwrap();
/// assert!(matches!(outcome, Outcome::Document(_)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Controller<'a> {
    api: &'a JsonApi,
}

impl<'a> Controller<'a> {
    /// Creates a controller.
    #[must_use]
    pub const fn new(api: &'a JsonApi) -> Self {
        Self { api }
    }

    /// Runs `operation` on `route` inside a span naming the target.
    ///
    /// `body` is the parsed request document; operations that read one fail
    /// with `InvalidJson` without it.
    pub fn dispatch(
        &self,
        operation: Operation,
        route: &Route,
        raw: RawParams,
        body: Option<&Value>,
    ) -> JsonApiResult<Outcome> {
        let span = tracing::info_span!(
            "jsonapi",
            operation = operation.as_str(),
            resource_type = route.type_name(),
            id = route.id(),
            relationship = route.relationship(),
        );
        let _entered = span.enter();

        match (operation, route) {
            (Operation::FetchCollection, Route::Collection { type_name }) => {
                self.fetch_collection(type_name, raw)
            }
            (Operation::Create, Route::Collection { type_name }) => {
                self.create(type_name, raw, require_body(body)?)
            }
            (Operation::FetchResource, Route::Resource { type_name, id }) => {
                self.fetch_resource(type_name, id, raw)
            }
            (Operation::Update, Route::Resource { type_name, id }) => {
                self.update(type_name, id, raw, require_body(body)?)
            }
            (
                Operation::FetchRelated,
                Route::Related {
                    type_name,
                    id,
                    relationship,
                },
            ) => self.fetch_related(type_name, id, relationship, raw),
            (
                Operation::FetchRelationship,
                Route::Relationship {
                    type_name,
                    id,
                    relationship,
                },
            ) => self.fetch_relationship(type_name, id, relationship, raw),
            (
                Operation::UpdateRelationship,
                Route::Relationship {
                    type_name,
                    id,
                    relationship,
                },
            ) => self.update_relationship(type_name, id, relationship, raw, require_body(body)?),
            (
                Operation::CreateRelationship,
                Route::Relationship {
                    type_name,
                    id,
                    relationship,
                },
            ) => self.create_relationship(type_name, id, relationship, raw, require_body(body)?),
            (
                Operation::DeleteRelationship,
                Route::Relationship {
                    type_name,
                    id,
                    relationship,
                },
            ) => self.delete_relationship(type_name, id, relationship, raw, require_body(body)?),
            (operation, route) => Err(JsonApiError::internal(format!(
                "operation {operation} does not apply to {route}"
            ))),
        }
    }

    /// `GET /{type}/{id}`
    pub fn fetch_resource(&self, type_name: &str, id: &str, raw: RawParams) -> JsonApiResult<Outcome> {
        let resource = self.resource(type_name)?;
        let params = self.resolve(type_name, raw, ParameterPolicy::SINGLE)?;
        let instance = self.fetch_one(resource, id)?;

        let document = Serializer::new(self.api, &params)
            .with_request_url(self.api.links().resource(type_name, id))
            .dump(&instance)?;
        Ok(Outcome::Document(document))
    }

    /// `GET /{type}`
    pub fn fetch_collection(&self, type_name: &str, raw: RawParams) -> JsonApiResult<Outcome> {
        let resource = self.resource(type_name)?;
        let params = self.resolve(type_name, raw, ParameterPolicy::COLLECTION)?;
        let store = resource.store();

        tracing::debug!(pagination = ?params.pagination(), "fetching collection");
        let instances = store
            .fetch_many(resource.model(), params.pagination())
            .map_err(|e| e.into_api_error(resource))?;
        let total = store
            .count(resource.model())
            .map_err(|e| e.into_api_error(resource))?;

        let document = Serializer::new(self.api, &params)
            .with_request_url(self.api.links().collection(type_name))
            .with_total(total)
            .dump_many(&instances)?;
        Ok(Outcome::Document(document))
    }

    /// `GET /{type}/{id}/{relationship}`
    ///
    /// Query parameters apply to the relationship's target type.
    pub fn fetch_related(
        &self,
        type_name: &str,
        id: &str,
        relationship: &str,
        raw: RawParams,
    ) -> JsonApiResult<Outcome> {
        let resource = self.resource(type_name)?;
        let descriptor = resource.require_relationship(relationship)?;
        let policy = if descriptor.is_many() {
            ParameterPolicy::COLLECTION
        } else {
            ParameterPolicy::SINGLE
        };
        let params = self.resolve(descriptor.target_type(), raw, policy)?;
        let instance = self.fetch_one(resource, id)?;
        let (related, total) = self.load_related(resource, &instance, descriptor, &params)?;

        let mut serializer = Serializer::new(self.api, &params)
            .with_request_url(self.api.links().related(type_name, id, relationship));
        if let Some(total) = total {
            serializer = serializer.with_total(total);
        }
        Ok(Outcome::Document(serializer.dump_related(&related)?))
    }

    /// `GET /{type}/{id}/relationships/{relationship}`
    pub fn fetch_relationship(
        &self,
        type_name: &str,
        id: &str,
        relationship: &str,
        raw: RawParams,
    ) -> JsonApiResult<Outcome> {
        let resource = self.resource(type_name)?;
        let descriptor = resource.require_relationship(relationship)?;
        let policy = ParameterPolicy {
            pagination: descriptor.is_many(),
            ..ParameterPolicy::NONE
        };
        let params = self.resolve(type_name, raw, policy)?;
        let instance = self.fetch_one(resource, id)?;
        let (related, total) = self.load_related(resource, &instance, descriptor, &params)?;

        let mut serializer = Serializer::new(self.api, &params)
            .with_request_url(self.api.links().relationship(type_name, id, relationship));
        if let Some(total) = total {
            serializer = serializer.with_total(total);
        }
        let document = serializer.dump_relationship(resource, &instance, descriptor, &related)?;
        Ok(Outcome::Document(document))
    }

    /// `POST /{type}`
    pub fn create(&self, type_name: &str, raw: RawParams, body: &Value) -> JsonApiResult<Outcome> {
        let resource = self.resource(type_name)?;
        let params = self.resolve(type_name, raw, ParameterPolicy::SINGLE)?;
        let parsed = RequestParser::new(self.api, resource).parse(body, None, false)?;
        let store = resource.store();

        tracing::debug!(client_id = parsed.id.as_deref(), "creating resource");
        let instance = store
            .create(resource.model(), parsed.id.as_deref(), parsed.fields)
            .map_err(|e| e.into_api_error(resource))?;
        let id = store.id(&instance).map_err(|e| {
            JsonApiError::internal_with_source(format!("cannot read id of new '{type_name}'"), e)
        })?;
        let location = self.api.links().resource(type_name, &id);
        tracing::info!(id = %id, "resource created");

        let document = Serializer::new(self.api, &params)
            .with_request_url(location.clone())
            .dump(&instance)?;
        Ok(Outcome::Created { document, location })
    }

    /// `PATCH /{type}/{id}`
    pub fn update(&self, type_name: &str, id: &str, raw: RawParams, body: &Value) -> JsonApiResult<Outcome> {
        let resource = self.resource(type_name)?;
        let params = self.resolve(type_name, raw, ParameterPolicy::SINGLE)?;
        let instance = self.fetch_one(resource, id)?;
        let parsed = RequestParser::new(self.api, resource).parse(body, Some(id), false)?;

        tracing::debug!(fields = parsed.fields.len(), "updating resource");
        let updated = resource
            .store()
            .update(&instance, parsed.fields)
            .map_err(|e| e.into_api_error(resource))?;

        let document = Serializer::new(self.api, &params)
            .with_request_url(self.api.links().resource(type_name, id))
            .dump(&updated)?;
        Ok(Outcome::Document(document))
    }

    /// `PATCH /{type}/{id}/relationships/{relationship}`: full replacement.
    pub fn update_relationship(
        &self,
        type_name: &str,
        id: &str,
        relationship: &str,
        raw: RawParams,
        body: &Value,
    ) -> JsonApiResult<Outcome> {
        let (resource, descriptor, instance) = self.relationship_target(type_name, id, relationship, raw)?;
        let related = RequestParser::new(self.api, resource).parse_relationship_object(
            descriptor,
            body,
            "",
            LinkageOptions::REPLACE,
        )?;

        tracing::debug!(count = related.len(), "replacing relationship");
        resource
            .store()
            .update_relationship(&instance, relationship, related)
            .map_err(|e| e.into_api_error(resource))?;
        Ok(Outcome::NoContent)
    }

    /// `POST /{type}/{id}/relationships/{relationship}`: adds members to a
    /// to-many relationship.
    pub fn create_relationship(
        &self,
        type_name: &str,
        id: &str,
        relationship: &str,
        raw: RawParams,
        body: &Value,
    ) -> JsonApiResult<Outcome> {
        let (resource, descriptor, instance) = self.relationship_target(type_name, id, relationship, raw)?;
        require_many("POST", type_name, descriptor)?;
        let related = RequestParser::new(self.api, resource).parse_relationship_object(
            descriptor,
            body,
            "",
            LinkageOptions::ADD,
        )?;

        tracing::debug!(count = related.len(), "adding to relationship");
        resource
            .store()
            .create_relationship(&instance, relationship, related.into_vec())
            .map_err(|e| e.into_api_error(resource))?;
        Ok(Outcome::NoContent)
    }

    /// `DELETE /{type}/{id}/relationships/{relationship}`: removes members
    /// from a to-many relationship, skipping identifiers that do not exist.
    pub fn delete_relationship(
        &self,
        type_name: &str,
        id: &str,
        relationship: &str,
        raw: RawParams,
        body: &Value,
    ) -> JsonApiResult<Outcome> {
        let (resource, descriptor, instance) = self.relationship_target(type_name, id, relationship, raw)?;
        require_many("DELETE", type_name, descriptor)?;
        let related = RequestParser::new(self.api, resource).parse_relationship_object(
            descriptor,
            body,
            "",
            LinkageOptions::REMOVE,
        )?;

        tracing::debug!(count = related.len(), "removing from relationship");
        resource
            .store()
            .delete_relationship(&instance, relationship, related.into_vec())
            .map_err(|e| e.into_api_error(resource))?;
        Ok(Outcome::NoContent)
    }

    fn resource(&self, type_name: &str) -> JsonApiResult<&'a ResourceDescriptor> {
        self.api.registry().by_type(type_name)
    }

    fn resolve(&self, type_name: &str, raw: RawParams, policy: ParameterPolicy) -> JsonApiResult<Parameters> {
        ParameterResolver::new(self.api).resolve(type_name, raw, policy)
    }

    fn fetch_one(&self, resource: &ResourceDescriptor, id: &str) -> JsonApiResult<Instance> {
        tracing::debug!(resource_type = resource.type_name(), id, "fetching resource");
        resource
            .store()
            .fetch_one(resource.model(), id)
            .map_err(|e| e.into_api_error(resource))
    }

    /// Shared prologue of the relationship mutations. No query parameters
    /// are accepted.
    fn relationship_target(
        &self,
        type_name: &str,
        id: &str,
        relationship: &str,
        raw: RawParams,
    ) -> JsonApiResult<(&'a ResourceDescriptor, &'a RelationshipDescriptor, Instance)> {
        let resource = self.resource(type_name)?;
        let descriptor = resource.require_relationship(relationship)?;
        self.resolve(type_name, raw, ParameterPolicy::NONE)?;
        let instance = self.fetch_one(resource, id)?;
        Ok((resource, descriptor, instance))
    }

    /// Loads related objects, paginated with their total for to-many.
    fn load_related(
        &self,
        resource: &ResourceDescriptor,
        instance: &Instance,
        descriptor: &RelationshipDescriptor,
        params: &Parameters,
    ) -> JsonApiResult<(Related, Option<usize>)> {
        let store = resource.store();
        let name = descriptor.name();
        if descriptor.is_many() {
            let total = store
                .count_related(instance, name)
                .map_err(|e| e.into_api_error(resource))?;
            let related = store
                .fetch_related(instance, name, params.pagination())
                .map_err(|e| e.into_api_error(resource))?;
            Ok((related, Some(total)))
        } else {
            let related = store
                .fetch_related(instance, name, None)
                .map_err(|e| e.into_api_error(resource))?;
            Ok((related, None))
        }
    }
}

fn require_body(body: Option<&Value>) -> JsonApiResult<&Value> {
    body.ok_or_else(|| JsonApiError::InvalidJson {
        detail: "request body is empty".to_string(),
    })
}

fn require_many(method: &str, type_name: &str, relationship: &RelationshipDescriptor) -> JsonApiResult<()> {
    if relationship.is_many() {
        Ok(())
    } else {
        Err(JsonApiError::method_not_allowed(
            method,
            format!("to-one relationship '{}' of '{type_name}'", relationship.name()),
        ))
    }
}
