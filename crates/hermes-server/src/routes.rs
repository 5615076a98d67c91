//! JSON:API URL routing.
//!
//! Every endpoint has one of four path shapes below the API's base path:
//!
//! | Path | GET | POST | PATCH | DELETE |
//! |---|---|---|---|---|
//! | `/{type}` | fetch collection | create | | |
//! | `/{type}/{id}` | fetch resource | | update | |
//! | `/{type}/{id}/{rel}` | fetch related | | | |
//! | `/{type}/{id}/relationships/{rel}` | fetch relationship | add | replace | remove |
//!
//! ```rust
//! use hermes_server::{Operation, Route};
//! use http::Method;
//!
//! let route = Route::parse("/api/books/11/relationships/chapters", "/api").unwrap();
//! assert_eq!(route.type_name(), "books");
//! assert_eq!(route.operation(&Method::DELETE).unwrap(), Operation::DeleteRelationship);
//! ```

use std::fmt;

use hermes_core::{JsonApiError, JsonApiResult};
use http::Method;

const RELATIONSHIPS: &str = "relationships";

/// A matched endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/{type}`
    Collection {
        /// Resource type.
        type_name: String,
    },
    /// `/{type}/{id}`
    Resource {
        /// Resource type.
        type_name: String,
        /// Resource id.
        id: String,
    },
    /// `/{type}/{id}/{relationship}`
    Related {
        /// Owner type.
        type_name: String,
        /// Owner id.
        id: String,
        /// Relationship name.
        relationship: String,
    },
    /// `/{type}/{id}/relationships/{relationship}`
    Relationship {
        /// Owner type.
        type_name: String,
        /// Owner id.
        id: String,
        /// Relationship name.
        relationship: String,
    },
}

/// What a request asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /{type}`
    FetchCollection,
    /// `POST /{type}`
    Create,
    /// `GET /{type}/{id}`
    FetchResource,
    /// `PATCH /{type}/{id}`
    Update,
    /// `GET /{type}/{id}/{rel}`
    FetchRelated,
    /// `GET /{type}/{id}/relationships/{rel}`
    FetchRelationship,
    /// `POST /{type}/{id}/relationships/{rel}`
    CreateRelationship,
    /// `PATCH /{type}/{id}/relationships/{rel}`
    UpdateRelationship,
    /// `DELETE /{type}/{id}/relationships/{rel}`
    DeleteRelationship,
}

impl Operation {
    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchCollection => "fetch_collection",
            Self::Create => "create",
            Self::FetchResource => "fetch_resource",
            Self::Update => "update",
            Self::FetchRelated => "fetch_related",
            Self::FetchRelationship => "fetch_relationship",
            Self::CreateRelationship => "create_relationship",
            Self::UpdateRelationship => "update_relationship",
            Self::DeleteRelationship => "delete_relationship",
        }
    }

    /// Whether the operation reads a request document.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(
            self,
            Self::Create
                | Self::Update
                | Self::CreateRelationship
                | Self::UpdateRelationship
                | Self::DeleteRelationship
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Route {
    /// Matches `path` below `base_path` (`""` for an API mounted at the root).
    ///
    /// Empty segments are ignored, so trailing slashes match. Segments are
    /// percent-decoded after splitting, so `%2F` stays inside an id.
    pub fn parse(path: &str, base_path: &str) -> JsonApiResult<Self> {
        let not_found = || JsonApiError::RouteNotFound {
            path: path.to_string(),
        };

        let relative = path.strip_prefix(base_path).ok_or_else(not_found)?;
        if !(relative.is_empty() || relative.starts_with('/')) {
            return Err(not_found());
        }

        let decoded = relative
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| urlencoding::decode(segment).map_err(|_| not_found()))
            .collect::<JsonApiResult<Vec<_>>>()?;
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();
        let route = match segments.as_slice() {
            [type_name] => Self::Collection {
                type_name: (*type_name).to_string(),
            },
            [type_name, id] => Self::Resource {
                type_name: (*type_name).to_string(),
                id: (*id).to_string(),
            },
            [type_name, id, relationship] => Self::Related {
                type_name: (*type_name).to_string(),
                id: (*id).to_string(),
                relationship: (*relationship).to_string(),
            },
            [type_name, id, RELATIONSHIPS, relationship] => Self::Relationship {
                type_name: (*type_name).to_string(),
                id: (*id).to_string(),
                relationship: (*relationship).to_string(),
            },
            _ => return Err(not_found()),
        };
        Ok(route)
    }

    /// The resource type named by the first segment.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Collection { type_name }
            | Self::Resource { type_name, .. }
            | Self::Related { type_name, .. }
            | Self::Relationship { type_name, .. } => type_name,
        }
    }

    /// The resource id, when the path has one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Collection { .. } => None,
            Self::Resource { id, .. } | Self::Related { id, .. } | Self::Relationship { id, .. } => {
                Some(id)
            }
        }
    }

    /// The relationship name, when the path has one.
    #[must_use]
    pub fn relationship(&self) -> Option<&str> {
        match self {
            Self::Related { relationship, .. } | Self::Relationship { relationship, .. } => {
                Some(relationship)
            }
            _ => None,
        }
    }

    /// Resolves the operation for `method`, or `MethodNotAllowed`.
    pub fn operation(&self, method: &Method) -> JsonApiResult<Operation> {
        let operation = match (self, method.as_str()) {
            (Self::Collection { .. }, "GET") => Operation::FetchCollection,
            (Self::Collection { .. }, "POST") => Operation::Create,
            (Self::Resource { .. }, "GET") => Operation::FetchResource,
            (Self::Resource { .. }, "PATCH") => Operation::Update,
            (Self::Related { .. }, "GET") => Operation::FetchRelated,
            (Self::Relationship { .. }, "GET") => Operation::FetchRelationship,
            (Self::Relationship { .. }, "POST") => Operation::CreateRelationship,
            (Self::Relationship { .. }, "PATCH") => Operation::UpdateRelationship,
            (Self::Relationship { .. }, "DELETE") => Operation::DeleteRelationship,
            _ => return Err(JsonApiError::method_not_allowed(method.as_str(), self.to_string())),
        };
        Ok(operation)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection { type_name } => write!(f, "/{type_name}"),
            Self::Resource { type_name, id } => write!(f, "/{type_name}/{}", urlencoding::encode(id)),
            Self::Related {
                type_name,
                id,
                relationship,
            } => write!(f, "/{type_name}/{}/{relationship}", urlencoding::encode(id)),
            Self::Relationship {
                type_name,
                id,
                relationship,
            } => write!(
                f,
                "/{type_name}/{}/{RELATIONSHIPS}/{relationship}",
                urlencoding::encode(id)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_four_shapes() {
        assert_eq!(
            Route::parse("/books", "").unwrap(),
            Route::Collection {
                type_name: "books".to_string()
            }
        );
        assert_eq!(Route::parse("/books/11", "").unwrap().id(), Some("11"));

        let related = Route::parse("/books/11/author", "").unwrap();
        assert!(matches!(related, Route::Related { .. }));
        assert_eq!(related.relationship(), Some("author"));

        let relationship = Route::parse("/books/11/relationships/author", "").unwrap();
        assert!(matches!(relationship, Route::Relationship { .. }));
        assert_eq!(relationship.to_string(), "/books/11/relationships/author");
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        let route = Route::parse("/authors/J%C3%B6rg", "").unwrap();
        assert_eq!(route.id(), Some("Jörg"));
        assert_eq!(route.to_string(), "/authors/J%C3%B6rg");

        let route = Route::parse("/books/a%2Fb/relationships/author", "").unwrap();
        assert_eq!(route.id(), Some("a/b"));
        assert_eq!(route.relationship(), Some("author"));

        assert!(Route::parse("/books/%FF", "").is_err());
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(Route::parse("/books/", "").unwrap().type_name(), "books");
    }

    #[test]
    fn test_base_path_is_stripped() {
        let route = Route::parse("/api/v1/books/1", "/api/v1").unwrap();
        assert_eq!(route.type_name(), "books");

        assert!(Route::parse("/books/1", "/api/v1").is_err());
        assert!(Route::parse("/api/v1books", "/api/v1").is_err());
    }

    #[test]
    fn test_unknown_shapes() {
        for path in ["/", "", "/books/1/author/extra", "/books/1/links/author", "/a/b/c/d/e"] {
            let error = Route::parse(path, "").unwrap_err();
            assert_eq!(error.status_code(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[test]
    fn test_operation_by_method() {
        let collection = Route::parse("/books", "").unwrap();
        assert_eq!(collection.operation(&Method::GET).unwrap(), Operation::FetchCollection);
        assert_eq!(collection.operation(&Method::POST).unwrap(), Operation::Create);

        let resource = Route::parse("/books/1", "").unwrap();
        assert_eq!(resource.operation(&Method::PATCH).unwrap(), Operation::Update);

        let relationship = Route::parse("/books/1/relationships/chapters", "").unwrap();
        assert_eq!(
            relationship.operation(&Method::PATCH).unwrap(),
            Operation::UpdateRelationship
        );
        assert!(Operation::UpdateRelationship.has_body());
        assert!(!Operation::FetchRelationship.has_body());
    }

    #[test]
    fn test_unsupported_method() {
        let resource = Route::parse("/books/1", "").unwrap();
        let error = resource.operation(&Method::DELETE).unwrap_err();
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(error.to_string().contains("/books/1"));

        let related = Route::parse("/books/1/author", "").unwrap();
        assert!(related.operation(&Method::POST).is_err());
    }
}
