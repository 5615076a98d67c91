//! Query parameter resolution.
//!
//! Turns [`RawParams`] into validated [`Parameters`] for one root resource
//! type. Groups are processed in order: `fields`, then `include`, then
//! `page`. Unknown top-level keys (e.g. `sort`, `filter`) are ignored.

use hermes_core::{
    IncludeTree, JsonApi, JsonApiError, JsonApiResult, Parameters, RawParams, RawValue,
    ResourceDescriptor,
};
use indexmap::IndexSet;

/// Which parameter groups an endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterPolicy {
    /// Accept `fields[...]`.
    pub fields: bool,
    /// Accept `include`.
    pub include: bool,
    /// Accept `page[...]`.
    pub pagination: bool,
}

impl ParameterPolicy {
    /// Single-resource reads and writes: fieldsets and includes.
    pub const SINGLE: Self = Self {
        fields: true,
        include: true,
        pagination: false,
    };

    /// Collection reads: everything.
    pub const COLLECTION: Self = Self {
        fields: true,
        include: true,
        pagination: true,
    };

    /// Relationship endpoints: nothing.
    pub const NONE: Self = Self {
        fields: false,
        include: false,
        pagination: false,
    };
}

/// Resolves raw query parameters against the registry.
///
/// # Example
///
/// ```
/// use hermes_core::fixtures::fantasy_api;
/// use hermes_core::RawParams;
/// use hermes_extract::{ParameterPolicy, ParameterResolver};
///
/// let api = fantasy_api("http://example.com").unwrap();
/// let raw = RawParams::from_pairs([("include", "author"), ("fields[books]", "title,author")]);
///
/// let params = ParameterResolver::new(&api)
///     .resolve("books", raw, ParameterPolicy::SINGLE)
///     .unwrap();
/// assert!(params.include().contains_path("author"));
/// assert!(params.allows_field("books", "title"));
/// assert!(!params.allows_field("books", "date_published"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'a> {
    api: &'a JsonApi,
}

impl<'a> ParameterResolver<'a> {
    /// Creates a resolver over an API.
    #[must_use]
    pub const fn new(api: &'a JsonApi) -> Self {
        Self { api }
    }

    /// Resolves `raw` for `root_type`.
    ///
    /// A group the policy does not accept is an `InvalidQueryParameter`
    /// error. With pagination accepted and no `page` group, the strategy's
    /// default window applies.
    pub fn resolve(
        &self,
        root_type: &str,
        raw: RawParams,
        policy: ParameterPolicy,
    ) -> JsonApiResult<Parameters> {
        let root = self.api.registry().by_type(root_type)?;
        let mut params = Parameters::new(root_type);

        if let Some(fields) = raw.get("fields") {
            if !policy.fields {
                return Err(JsonApiError::invalid_query_parameter(
                    "fields",
                    "sparse fieldsets are not supported by this endpoint",
                ));
            }
            for (type_name, set) in self.parse_fields(fields)? {
                params = params.with_fields(type_name, set);
            }
        }

        if let Some(include) = raw.get("include") {
            if !policy.include {
                return Err(JsonApiError::invalid_query_parameter(
                    "include",
                    "inclusion is not supported by this endpoint",
                ));
            }
            params = params.with_include(self.parse_include(root, include)?);
        }

        let page = match raw.get("page") {
            None => None,
            Some(_) if !policy.pagination => {
                return Err(JsonApiError::invalid_query_parameter(
                    "page",
                    "pagination is not supported by this endpoint",
                ));
            }
            Some(RawValue::Group(members)) => Some(members),
            Some(RawValue::Single(_)) => {
                return Err(JsonApiError::invalid_page_parameter(
                    "page",
                    "expected bracketed members such as page[number]",
                ));
            }
        };
        if policy.pagination {
            params = params.with_pagination(self.api.pagination().parse(page)?);
        }

        tracing::trace!(
            root_type,
            include = ?params.include().paths(),
            pagination = ?params.pagination(),
            "resolved query parameters"
        );
        Ok(params.with_raw(raw))
    }

    fn parse_fields(&self, value: &RawValue) -> JsonApiResult<Vec<(String, IndexSet<String>)>> {
        let RawValue::Group(groups) = value else {
            return Err(JsonApiError::invalid_query_parameter(
                "fields",
                "expected fields[TYPE]=FIELD,FIELD",
            ));
        };
        groups
            .iter()
            .map(|(type_name, list)| {
                let descriptor = self.api.registry().get(type_name).ok_or_else(|| {
                    JsonApiError::invalid_query_parameter(
                        format!("fields[{type_name}]"),
                        format!("unknown resource type '{type_name}'"),
                    )
                })?;
                let set = split_list(list)
                    .map(|field| {
                        if descriptor.has_field(field) {
                            Ok(field.to_string())
                        } else {
                            Err(JsonApiError::invalid_field(type_name, field))
                        }
                    })
                    .collect::<JsonApiResult<IndexSet<String>>>()?;
                Ok((type_name.clone(), set))
            })
            .collect()
    }

    fn parse_include(&self, root: &ResourceDescriptor, value: &RawValue) -> JsonApiResult<IncludeTree> {
        let RawValue::Single(list) = value else {
            return Err(JsonApiError::invalid_query_parameter(
                "include",
                "expected include=PATH,PATH",
            ));
        };
        let mut tree = IncludeTree::new();
        for path in split_list(list) {
            self.check_include_path(root, path)?;
            tree.insert_path(path.split('.'));
        }
        Ok(tree)
    }

    /// Walks a dotted path left to right and stops at the first segment
    /// that is not a relationship of the current type.
    fn check_include_path(&self, root: &ResourceDescriptor, path: &str) -> JsonApiResult<()> {
        let mut current = root;
        for segment in path.split('.') {
            let relationship = current.relationship(segment).ok_or_else(|| {
                JsonApiError::invalid_include(
                    path,
                    format!("'{segment}' is not a relationship of '{}'", current.type_name()),
                )
            })?;
            current = self.api.registry().by_type(relationship.target_type())?;
        }
        Ok(())
    }
}

/// Splits a comma-separated list, dropping empty items.
fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::fixtures::fantasy_api;
    use hermes_core::Pagination;

    fn resolve(root: &str, pairs: &[(&str, &str)], policy: ParameterPolicy) -> JsonApiResult<Parameters> {
        let api = fantasy_api("http://example.com").unwrap();
        let raw = RawParams::from_pairs(pairs.iter().copied());
        ParameterResolver::new(&api).resolve(root, raw, policy)
    }

    #[test]
    fn test_empty_params() {
        let params = resolve("books", &[], ParameterPolicy::SINGLE).unwrap();
        assert_eq!(params.type_name(), "books");
        assert!(params.include().is_empty());
        assert!(params.pagination().is_none());
    }

    #[test]
    fn test_collection_gets_default_page() {
        let params = resolve("books", &[], ParameterPolicy::COLLECTION).unwrap();
        assert_eq!(
            params.pagination(),
            Some(&Pagination::PageNumber { number: 1, size: 20 })
        );
    }

    #[test]
    fn test_fields_for_several_types() {
        let params = resolve(
            "authors",
            &[("fields[authors]", "name, books"), ("fields[books]", "title")],
            ParameterPolicy::SINGLE,
        )
        .unwrap();
        assert!(params.allows_field("authors", "books"));
        assert!(!params.allows_field("authors", "date_of_birth"));
        assert!(params.allows_field("books", "title"));
        assert!(!params.allows_field("books", "author"));
    }

    #[test]
    fn test_unknown_field() {
        let error = resolve("books", &[("fields[books]", "title,isbn")], ParameterPolicy::SINGLE)
            .unwrap_err();
        assert!(matches!(
            error,
            JsonApiError::InvalidField { ref type_name, ref field } if type_name == "books" && field == "isbn"
        ));
    }

    #[test]
    fn test_fields_for_unknown_type() {
        let error = resolve("books", &[("fields[planets]", "name")], ParameterPolicy::SINGLE)
            .unwrap_err();
        assert!(matches!(
            error,
            JsonApiError::InvalidQueryParameter { ref parameter, .. } if parameter == "fields[planets]"
        ));
    }

    #[test]
    fn test_fields_without_type() {
        let error = resolve("books", &[("fields", "title")], ParameterPolicy::SINGLE).unwrap_err();
        assert!(matches!(error, JsonApiError::InvalidQueryParameter { .. }));
    }

    #[test]
    fn test_include_tree_with_ancestors() {
        let params = resolve("authors", &[("include", "books.series,books.chapters")], ParameterPolicy::SINGLE)
            .unwrap();
        assert_eq!(
            params.include().paths(),
            ["books", "books.series", "books.chapters"]
        );
    }

    #[test]
    fn test_include_first_bad_segment() {
        let error = resolve("books", &[("include", "publisher.owner")], ParameterPolicy::SINGLE)
            .unwrap_err();
        match error {
            JsonApiError::InvalidInclude { path, detail } => {
                assert_eq!(path, "publisher.owner");
                assert!(detail.contains("'publisher'"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_include_bad_nested_segment() {
        let error = resolve("books", &[("include", "author.publisher")], ParameterPolicy::SINGLE)
            .unwrap_err();
        match error {
            JsonApiError::InvalidInclude { detail, .. } => {
                assert!(detail.contains("'publisher' is not a relationship of 'authors'"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_disallowed_groups() {
        for key in ["fields[books]", "include", "page[number]"] {
            let error = resolve("books", &[(key, "1")], ParameterPolicy::NONE).unwrap_err();
            assert!(
                matches!(error, JsonApiError::InvalidQueryParameter { .. }),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn test_page_on_single_resource_rejected() {
        let error = resolve("books", &[("page[size]", "2")], ParameterPolicy::SINGLE).unwrap_err();
        assert!(matches!(error, JsonApiError::InvalidQueryParameter { ref parameter, .. } if parameter == "page"));
    }

    #[test]
    fn test_bad_page_value() {
        let error = resolve("books", &[("page[size]", "many")], ParameterPolicy::COLLECTION).unwrap_err();
        assert!(matches!(error, JsonApiError::InvalidPageParameter { .. }));

        let error = resolve("books", &[("page", "2")], ParameterPolicy::COLLECTION).unwrap_err();
        assert!(matches!(error, JsonApiError::InvalidPageParameter { .. }));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let params = resolve("books", &[("sort", "-title"), ("filter[title]", "x")], ParameterPolicy::SINGLE)
            .unwrap();
        assert!(params.raw().contains("sort"));
    }

    #[test]
    fn test_unknown_root_type() {
        let error = resolve("planets", &[], ParameterPolicy::SINGLE).unwrap_err();
        assert!(matches!(error, JsonApiError::ResourceTypeNotFound { .. }));
    }
}
