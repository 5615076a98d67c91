//! Resource objects and documents.

use crate::inclusion::Inclusion;
use hermes_core::{
    Document, Instance, JsonApi, JsonApiError, JsonApiResult, LinkBuilder, Linkage, Links,
    Parameters, PrimaryData, Related, RelatedIds, RelationshipDescriptor, ResourceDescriptor,
    ResourceIdentifier, ResourceObject, StoreError,
};
use hermes_core::document::{Relationship, RelationshipLinks, ResourceLinks};
use indexmap::IndexMap;

/// Serializes model instances into JSON:API documents.
///
/// A serializer is scoped to one request: the resolved [`Parameters`] decide
/// sparse fieldsets, the include tree and pagination. Document-level links
/// are only emitted when the request URL is known.
///
/// # Example
///
/// ```
/// use hermes_core::fixtures::{fantasy_api, Book};
/// use hermes_core::{ModelType, Parameters, PrimaryData};
/// use hermes_serializer::Serializer;
///
/// let api = fantasy_api("http://example.com").unwrap();
/// let books = api.registry().by_type("books").unwrap();
/// let hobbit = books.store().fetch_one(&ModelType::of::<Book>(), "11").unwrap();
///
/// let params = Parameters::new("books");
/// let document = Serializer::new(&api, &params).dump(&hobbit).unwrap();
///
/// let PrimaryData::Resource(book) = document.data else { unreachable!() };
/// assert_eq!(book.id, "11");
/// assert_eq!(book.attributes["title"], "The Hobbit");
/// ```
#[derive(Debug, Clone)]
pub struct Serializer<'a> {
    api: &'a JsonApi,
    params: &'a Parameters,
    request_url: Option<String>,
    total: Option<usize>,
}

impl<'a> Serializer<'a> {
    /// Creates a serializer for one request.
    #[must_use]
    pub fn new(api: &'a JsonApi, params: &'a Parameters) -> Self {
        Self {
            api,
            params,
            request_url: None,
            total: None,
        }
    }

    /// Sets the request URL (without query string) used for document links.
    #[must_use]
    pub fn with_request_url(mut self, url: impl Into<String>) -> Self {
        self.request_url = Some(url.into());
        self
    }

    /// Sets the total number of items of a paginated collection.
    #[must_use]
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Serializes a single object.
    pub fn dump(&self, instance: &Instance) -> JsonApiResult<Document> {
        let descriptor = self.api.registry().by_instance(instance)?;
        let object = self.resource_object(descriptor, instance)?;

        let mut inclusion = Inclusion::new(self);
        inclusion.seed(object.identifier());
        inclusion.walk(descriptor, instance, object.identifier(), self.params.include(), "")?;

        Ok(self.finish(PrimaryData::Resource(Box::new(object)), inclusion.into_included(), false))
    }

    /// Serializes a collection, preserving its order.
    pub fn dump_many(&self, instances: &[Instance]) -> JsonApiResult<Document> {
        let mut objects = Vec::with_capacity(instances.len());
        let mut primary = Vec::with_capacity(instances.len());
        for instance in instances {
            let descriptor = self.api.registry().by_instance(instance)?;
            let object = self.resource_object(descriptor, instance)?;
            primary.push((descriptor, instance, object.identifier()));
            objects.push(object);
        }

        let mut inclusion = Inclusion::new(self);
        for (_, _, identifier) in &primary {
            inclusion.seed(identifier.clone());
        }
        for (descriptor, instance, identifier) in primary {
            inclusion.walk(descriptor, instance, identifier, self.params.include(), "")?;
        }

        Ok(self.finish(PrimaryData::Resources(objects), inclusion.into_included(), true))
    }

    /// Serializes the objects behind a related-resource endpoint.
    ///
    /// An empty to-one relationship yields `{"data": null}`.
    pub fn dump_related(&self, related: &Related) -> JsonApiResult<Document> {
        match related {
            Related::ToOne(Some(one)) => self.dump(one),
            Related::ToOne(None) => Ok(self.finish(PrimaryData::Null, Vec::new(), false)),
            Related::ToMany(many) => self.dump_many(many),
        }
    }

    /// Serializes a relationship endpoint: the linkage of `related` plus
    /// `self` and `related` links of the owning object.
    pub fn dump_relationship(
        &self,
        owner: &ResourceDescriptor,
        instance: &Instance,
        relationship: &RelationshipDescriptor,
        related: &Related,
    ) -> JsonApiResult<Document> {
        let owner_id = self.read_id(owner, instance)?;
        let target = self.api.registry().by_type(relationship.target_type())?;
        let identifiers = related
            .iter()
            .map(|object| {
                let id = self.read_id(target, object)?;
                Ok(ResourceIdentifier::new(target.type_name(), id))
            })
            .collect::<JsonApiResult<Vec<_>>>()?;
        let linkage = shape_linkage(owner, relationship, identifiers)?;

        let links = self.api.links();
        let self_url = self.request_url.clone().unwrap_or_else(|| {
            links.relationship(owner.type_name(), &owner_id, relationship.name())
        });
        let pagination = if relationship.is_many() { self.params.pagination() } else { None };
        let mut document_links =
            LinkBuilder::document_links(&self_url, self.params.raw(), pagination, self.total);
        document_links.shift_insert(
            1,
            "related".to_string(),
            Some(links.related(owner.type_name(), &owner_id, relationship.name())),
        );

        Ok(Document::new(linkage.into()).with_links(document_links))
    }

    fn finish(&self, data: PrimaryData, included: Vec<ResourceObject>, many: bool) -> Document {
        tracing::debug!(
            type_name = self.params.type_name(),
            included = included.len(),
            "serialized document"
        );
        let mut document = Document::new(data);
        document.included = included;
        if let Some(url) = &self.request_url {
            let pagination = if many { self.params.pagination() } else { None };
            document.links = document_links(url, self.params, pagination, self.total);
        }
        document
    }

    /// Builds one resource object, honouring the sparse fieldset of its type.
    pub(crate) fn resource_object(
        &self,
        descriptor: &ResourceDescriptor,
        instance: &Instance,
    ) -> JsonApiResult<ResourceObject> {
        let type_name = descriptor.type_name();
        let id = self.read_id(descriptor, instance)?;
        let store = descriptor.store();
        let links = self.api.links();

        let mut attributes = IndexMap::new();
        for name in descriptor.attributes() {
            if !self.params.allows_field(type_name, name) {
                continue;
            }
            let value = store
                .attribute(instance, name)
                .map_err(|e| read_failure(type_name, &id, name, e))?;
            attributes.insert(name.clone(), value);
        }

        let mut relationships = IndexMap::new();
        for relationship in descriptor.relationships().values() {
            let name = relationship.name();
            if !self.params.allows_field(type_name, name) {
                continue;
            }
            let ids = store
                .related_ids(instance, name)
                .map_err(|e| read_failure(type_name, &id, name, e))?;
            let identifiers = match ids {
                RelatedIds::ToOne(one) => one.into_iter().collect(),
                RelatedIds::ToMany(many) => many,
            }
            .into_iter()
            .map(|related_id| ResourceIdentifier::new(relationship.target_type(), related_id))
            .collect();

            relationships.insert(
                name.to_string(),
                Relationship {
                    links: RelationshipLinks {
                        self_link: links.relationship(type_name, &id, name),
                        related: links.related(type_name, &id, name),
                    },
                    data: shape_linkage(descriptor, relationship, identifiers)?,
                },
            );
        }

        Ok(ResourceObject {
            type_name: type_name.to_string(),
            links: ResourceLinks {
                self_link: links.resource(type_name, &id),
            },
            id,
            attributes,
            relationships,
        })
    }

    pub(crate) fn read_id(&self, descriptor: &ResourceDescriptor, instance: &Instance) -> JsonApiResult<String> {
        descriptor.store().id(instance).map_err(|e| {
            JsonApiError::internal_with_source(
                format!("failed to read the id of a '{}' object", descriptor.type_name()),
                e,
            )
        })
    }

    pub(crate) fn api(&self) -> &'a JsonApi {
        self.api
    }
}

fn document_links(
    url: &str,
    params: &Parameters,
    pagination: Option<&hermes_core::Pagination>,
    total: Option<usize>,
) -> Links {
    LinkBuilder::document_links(url, params.raw(), pagination, total)
}

/// Shapes identifiers by the relationship's cardinality.
fn shape_linkage(
    owner: &ResourceDescriptor,
    relationship: &RelationshipDescriptor,
    identifiers: Vec<ResourceIdentifier>,
) -> JsonApiResult<Linkage> {
    if relationship.is_many() {
        return Ok(Linkage::ToMany(identifiers));
    }
    if identifiers.len() > 1 {
        return Err(JsonApiError::internal(format!(
            "to-one relationship '{}' of '{}' has {} related objects",
            relationship.name(),
            owner.type_name(),
            identifiers.len()
        )));
    }
    Ok(Linkage::ToOne(identifiers.into_iter().next()))
}

pub(crate) fn read_failure(type_name: &str, id: &str, field: &str, error: StoreError) -> JsonApiError {
    JsonApiError::internal_with_source(format!("failed to read '{field}' of {type_name} '{id}'"), error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::fixtures::{fantasy_api, Author, Book};
    use hermes_core::{IncludeTree, ModelType, Pagination, RawParams};
    use hermes_extract::RequestParser;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    const BOOK_FIELDS: [&str; 5] = ["title", "date_published", "author", "chapters", "series"];

    fn fetch<T: 'static>(api: &JsonApi, type_name: &str, id: &str) -> Instance {
        api.registry()
            .by_type(type_name)
            .unwrap()
            .store()
            .fetch_one(&ModelType::of::<T>(), id)
            .unwrap()
    }

    fn to_json(document: &Document) -> Value {
        serde_json::to_value(document).unwrap()
    }

    #[test]
    fn test_single_resource() {
        let api = fantasy_api("http://example.com").unwrap();
        let params = Parameters::new("books");
        let document = Serializer::new(&api, &params)
            .dump(&fetch::<Book>(&api, "books", "11"))
            .unwrap();

        let chapters: Vec<Value> = (271..=289)
            .map(|id| json!({"type": "chapters", "id": id.to_string()}))
            .collect();
        assert_eq!(
            to_json(&document),
            json!({
                "data": {
                    "type": "books",
                    "id": "11",
                    "links": {"self": "http://example.com/books/11"},
                    "attributes": {
                        "title": "The Hobbit",
                        "date_published": "1937-09-21"
                    },
                    "relationships": {
                        "author": {
                            "links": {
                                "self": "http://example.com/books/11/relationships/author",
                                "related": "http://example.com/books/11/author"
                            },
                            "data": {"type": "authors", "id": "1"}
                        },
                        "chapters": {
                            "links": {
                                "self": "http://example.com/books/11/relationships/chapters",
                                "related": "http://example.com/books/11/chapters"
                            },
                            "data": chapters
                        },
                        "series": {
                            "links": {
                                "self": "http://example.com/books/11/relationships/series",
                                "related": "http://example.com/books/11/series"
                            },
                            "data": null
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_sparse_fieldsets() {
        let api = fantasy_api("http://example.com").unwrap();
        let params = Parameters::new("books").with_fields("books", ["title", "author"]);
        let document = Serializer::new(&api, &params)
            .dump(&fetch::<Book>(&api, "books", "11"))
            .unwrap();

        let data = &to_json(&document)["data"];
        assert_eq!(data["attributes"], json!({"title": "The Hobbit"}));
        assert_eq!(
            data["relationships"].as_object().unwrap().keys().collect::<Vec<_>>(),
            ["author"]
        );
    }

    #[test]
    fn test_empty_fieldset_omits_members() {
        let api = fantasy_api("http://example.com").unwrap();
        let params = Parameters::new("books").with_fields("books", Vec::<String>::new());
        let document = Serializer::new(&api, &params)
            .dump(&fetch::<Book>(&api, "books", "11"))
            .unwrap();

        let data = to_json(&document)["data"].clone();
        assert!(data.get("attributes").is_none());
        assert!(data.get("relationships").is_none());
        assert_eq!(data["links"]["self"], "http://example.com/books/11");
    }

    #[test]
    fn test_inclusion_of_related_resources() {
        let api = fantasy_api("http://example.com").unwrap();
        let mut include = IncludeTree::new();
        include.insert_path(["books"]);
        include.insert_path(["books", "series"]);
        let params = Parameters::new("authors")
            .with_fields("authors", ["name", "books"])
            .with_fields("books", ["title"])
            .with_fields("series", ["title"])
            .with_include(include);

        let document = Serializer::new(&api, &params)
            .dump(&fetch::<Author>(&api, "authors", "1"))
            .unwrap();

        let included: Vec<(String, String, Value)> = document
            .included
            .iter()
            .map(|object| (object.type_name.clone(), object.id.clone(), object.attributes["title"].clone()))
            .collect();
        assert_eq!(
            included,
            [
                ("books".into(), "1".into(), json!("The Fellowship of the Ring")),
                ("series".into(), "1".into(), json!("The Lord of the Rings")),
                ("books".into(), "2".into(), json!("The Two Towers")),
                ("books".into(), "3".into(), json!("Return of the King")),
                ("books".into(), "11".into(), json!("The Hobbit")),
            ]
        );
        assert!(document.included.iter().all(|object| object.relationships.is_empty()));

        let data = &to_json(&document)["data"];
        assert_eq!(data["attributes"], json!({"name": "J. R. R. Tolkien"}));
        assert_eq!(
            data["relationships"]["books"]["data"],
            json!([
                {"type": "books", "id": "1"},
                {"type": "books", "id": "2"},
                {"type": "books", "id": "3"},
                {"type": "books", "id": "11"}
            ])
        );
    }

    #[test]
    fn test_cycle_does_not_repeat_primary() {
        let api = fantasy_api("http://example.com").unwrap();
        let mut include = IncludeTree::new();
        include.insert_path(["author", "books"]);
        let params = Parameters::new("books").with_include(include);

        let document = Serializer::new(&api, &params)
            .dump(&fetch::<Book>(&api, "books", "11"))
            .unwrap();

        let identifiers: Vec<String> = document
            .included
            .iter()
            .map(|object| format!("{}:{}", object.type_name, object.id))
            .collect();
        assert_eq!(identifiers, ["authors:1", "books:1", "books:2", "books:3"]);
    }

    #[test]
    fn test_resource_collection() {
        let api = fantasy_api("http://example.com").unwrap();
        let books = api.registry().by_type("books").unwrap();
        let all = books.store().fetch_many(books.model(), None).unwrap();
        let params = Parameters::new("books");

        let document = Serializer::new(&api, &params).dump_many(&all).unwrap();
        match document.data {
            PrimaryData::Resources(objects) => {
                assert_eq!(objects.len(), 11);
                assert_eq!(objects[0].id, "1");
                assert_eq!(objects[10].id, "11");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(document.links.is_empty());
    }

    #[test]
    fn test_collection_pagination_links() {
        let api = fantasy_api("http://example.com").unwrap();
        let raw = RawParams::from_pairs([("page[number]", "2"), ("page[size]", "5")]);
        let params = Parameters::new("books")
            .with_pagination(Pagination::PageNumber { number: 2, size: 5 })
            .with_raw(raw);
        let books = api.registry().by_type("books").unwrap();
        let page = books.store().fetch_many(books.model(), params.pagination()).unwrap();

        let document = Serializer::new(&api, &params)
            .with_request_url("http://example.com/books")
            .with_total(11)
            .dump_many(&page)
            .unwrap();

        assert_eq!(
            document.links.keys().map(String::as_str).collect::<Vec<_>>(),
            ["self", "first", "last", "prev", "next"]
        );
        assert_eq!(
            document.links["next"].as_deref(),
            Some("http://example.com/books?page%5Bnumber%5D=3&page%5Bsize%5D=5")
        );
    }

    #[test]
    fn test_related_to_one_absent() {
        let api = fantasy_api("http://example.com").unwrap();
        let params = Parameters::new("series");
        let document = Serializer::new(&api, &params)
            .with_request_url("http://example.com/books/11/series")
            .dump_related(&Related::ToOne(None))
            .unwrap();
        assert_eq!(
            to_json(&document),
            json!({"data": null, "links": {"self": "http://example.com/books/11/series"}})
        );
    }

    #[test]
    fn test_relationship_document() {
        let api = fantasy_api("http://example.com").unwrap();
        let books = api.registry().by_type("books").unwrap();
        let hobbit = fetch::<Book>(&api, "books", "11");
        let author = books.relationship("author").unwrap();
        let related = books.store().related(&hobbit, "author").unwrap();
        let params = Parameters::new("authors");

        let document = Serializer::new(&api, &params)
            .dump_relationship(books, &hobbit, author, &related)
            .unwrap();
        assert_eq!(
            to_json(&document),
            json!({
                "data": {"type": "authors", "id": "1"},
                "links": {
                    "self": "http://example.com/books/11/relationships/author",
                    "related": "http://example.com/books/11/author"
                }
            })
        );
    }

    #[test]
    fn test_to_one_with_many_ids_is_internal_error() {
        let owner = fantasy_api("http://example.com").unwrap();
        let books = owner.registry().by_type("books").unwrap();
        let author = books.relationship("author").unwrap();
        let error = shape_linkage(
            books,
            author,
            vec![ResourceIdentifier::new("authors", "1"), ResourceIdentifier::new("authors", "2")],
        )
        .unwrap_err();
        assert!(matches!(error, JsonApiError::Internal { .. }));
    }

    fn dump_data(api: &JsonApi, type_name: &str, id: &str) -> Value {
        let descriptor = api.registry().by_type(type_name).unwrap();
        let instance = descriptor.store().fetch_one(descriptor.model(), id).unwrap();
        let params = Parameters::new(type_name);
        let document = Serializer::new(api, &params).dump(&instance).unwrap();
        to_json(&document)["data"].clone()
    }

    #[test]
    fn test_dump_then_update_keeps_field_values() {
        for (type_name, id) in [
            ("books", "11"),
            ("books", "1"),
            ("authors", "1"),
            ("authors", "3"),
            ("series", "2"),
            ("chapters", "271"),
        ] {
            let api = fantasy_api("http://example.com").unwrap();
            let descriptor = api.registry().by_type(type_name).unwrap();
            let before = dump_data(&api, type_name, id);

            let parsed = RequestParser::new(&api, descriptor)
                .parse(&json!({ "data": before.clone() }), Some(id), false)
                .unwrap();
            let instance = descriptor.store().fetch_one(descriptor.model(), id).unwrap();
            descriptor.store().update(&instance, parsed.fields).unwrap();

            let after = dump_data(&api, type_name, id);
            assert_eq!(after["attributes"], before["attributes"], "{type_name}/{id}");
            assert_eq!(after["relationships"], before["relationships"], "{type_name}/{id}");
        }
    }

    proptest! {
        #[test]
        fn prop_fieldset_selects_exactly_requested_members(
            fields in proptest::sample::subsequence(BOOK_FIELDS.to_vec(), 0..=BOOK_FIELDS.len()),
            id in 1u32..=11,
        ) {
            let api = fantasy_api("http://example.com").unwrap();
            let params = Parameters::new("books").with_fields("books", fields.clone());
            let document = Serializer::new(&api, &params)
                .dump(&fetch::<Book>(&api, "books", &id.to_string()))
                .unwrap();
            let data = to_json(&document)["data"].clone();

            let mut members: Vec<String> = Vec::new();
            for group in ["attributes", "relationships"] {
                if let Some(object) = data.get(group) {
                    members.extend(object.as_object().unwrap().keys().cloned());
                }
            }
            members.sort();
            let mut expected: Vec<String> = fields.iter().map(ToString::to_string).collect();
            expected.sort();
            prop_assert_eq!(members, expected);

            let books = api.registry().by_type("books").unwrap();
            if let Some(relationships) = data.get("relationships").and_then(Value::as_object) {
                for (name, relationship) in relationships {
                    let linkage = &relationship["data"];
                    if books.relationship(name).unwrap().is_many() {
                        prop_assert!(linkage.is_array(), "{} linkage is {}", name, linkage);
                    } else {
                        prop_assert!(linkage.is_null() || linkage.is_object(), "{} linkage is {}", name, linkage);
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_to_many_is_empty_array() {
        let api = fantasy_api("http://example.com").unwrap();
        let data = dump_data(&api, "books", "1");
        assert_eq!(data["relationships"]["chapters"]["data"], json!([]));

        let data = dump_data(&api, "books", "11");
        assert_eq!(data["relationships"]["series"]["data"], Value::Null);
    }
}
