//! Error types for Hermes.
//!
//! This module provides [`JsonApiError`], the structured error raised by every
//! Hermes component, and [`ErrorDocument`], its JSON:API wire representation.
//!
//! Core components never build HTTP responses. They raise a `JsonApiError`
//! carrying enough context (type, id, field, JSON pointer, query parameter) and
//! the controller layer turns it into an error document:
//!
//! | Variant | Status |
//! |---|---|
//! | `ResourceTypeNotFound`, `ResourceNotFound`, `RelationshipNotFound`, `RouteNotFound` | 404 |
//! | `InvalidJson`, `InvalidQueryParameter`, `InvalidField`, `InvalidInclude`, `InvalidPageParameter`, `Validation` | 400 |
//! | `MethodNotAllowed` | 405 |
//! | `ResourceAlreadyExists`, `Conflict` | 409 |
//! | `DuplicateType`, `Internal` | 500 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using [`JsonApiError`].
pub type JsonApiResult<T> = Result<T, JsonApiError>;

/// A single schema violation found in a request document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending member (e.g. `/data/attributes/title`).
    pub pointer: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

/// Standard error type for Hermes.
///
/// # Example
///
/// ```
/// use hermes_core::JsonApiError;
/// use http::StatusCode;
///
/// let error = JsonApiError::invalid_include("books.publisher", "'publisher' is not a relationship of 'books'");
/// assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
/// assert!(error.is_query_parameter_error());
/// ```
#[derive(Error, Debug)]
pub enum JsonApiError {
    /// A resource type was registered twice.
    #[error("resource type '{type_name}' is already registered")]
    DuplicateType {
        /// The duplicated type name.
        type_name: String,
    },

    /// The requested resource type is not registered.
    #[error("resource type '{type_name}' not found")]
    ResourceTypeNotFound {
        /// The unknown type name.
        type_name: String,
    },

    /// A resource (or a model type in a reverse lookup) does not exist.
    #[error("{}", describe_missing(.type_name, .id.as_deref()))]
    ResourceNotFound {
        /// The resource type (or model name for reverse lookups).
        type_name: String,
        /// The missing identifier, when one was requested.
        id: Option<String>,
        /// JSON pointer into the request body that referenced the resource.
        source_pointer: Option<String>,
    },

    /// The relationship is not declared on the resource type.
    #[error("relationship '{relationship}' not found on resource type '{type_name}'")]
    RelationshipNotFound {
        /// The resource type.
        type_name: String,
        /// The unknown relationship name.
        relationship: String,
    },

    /// A resource with a client-supplied id already exists.
    #[error("resource '{type_name}' with id '{id}' already exists")]
    ResourceAlreadyExists {
        /// The resource type.
        type_name: String,
        /// The conflicting identifier.
        id: String,
    },

    /// The request body could not be parsed as JSON.
    #[error("request body is not valid JSON: {detail}")]
    InvalidJson {
        /// The parser's message.
        detail: String,
    },

    /// A query parameter is malformed or not permitted on this endpoint.
    #[error("invalid query parameter '{parameter}': {detail}")]
    InvalidQueryParameter {
        /// The offending parameter key (e.g. `fields`, `page`).
        parameter: String,
        /// What is wrong with it.
        detail: String,
    },

    /// A sparse fieldset names an unknown attribute or relationship.
    #[error("invalid field '{field}' for resource type '{type_name}'")]
    InvalidField {
        /// The resource type of the fieldset.
        type_name: String,
        /// The unknown field name.
        field: String,
    },

    /// An include path does not follow declared relationships.
    #[error("invalid include path '{path}': {detail}")]
    InvalidInclude {
        /// The full dotted path as sent by the client.
        path: String,
        /// Which segment failed and why.
        detail: String,
    },

    /// A pagination parameter is unknown or not numeric.
    #[error("invalid page parameter '{parameter}': {detail}")]
    InvalidPageParameter {
        /// The parameter key (e.g. `page[size]`).
        parameter: String,
        /// What is wrong with it.
        detail: String,
    },

    /// The request document does not match the resource's schema.
    #[error("request document is invalid: {}", summarize(.violations))]
    Validation {
        /// Every violation found.
        violations: Vec<Violation>,
    },

    /// The request document disagrees with the endpoint (type or id mismatch).
    #[error("{detail}")]
    Conflict {
        /// Human-readable description.
        detail: String,
        /// JSON pointer to the conflicting member.
        pointer: Option<String>,
    },

    /// The HTTP method is not supported for the target.
    #[error("method {method} is not allowed on {target}")]
    MethodNotAllowed {
        /// The rejected method.
        method: String,
        /// The endpoint or relationship it was applied to.
        target: String,
    },

    /// No endpoint matches the request path.
    #[error("no endpoint matches '{path}'")]
    RouteNotFound {
        /// The unmatched path.
        path: String,
    },

    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message (not exposed to clients).
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

fn describe_missing(type_name: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("resource '{type_name}' with id '{id}' not found"),
        None => format!("no resource registered for '{type_name}'"),
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl JsonApiError {
    /// Creates a resource-type-not-found error.
    #[must_use]
    pub fn resource_type_not_found(type_name: impl Into<String>) -> Self {
        Self::ResourceTypeNotFound {
            type_name: type_name.into(),
        }
    }

    /// Creates a resource-not-found error for `(type, id)`.
    #[must_use]
    pub fn resource_not_found(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            type_name: type_name.into(),
            id: Some(id.into()),
            source_pointer: None,
        }
    }

    /// Creates a relationship-not-found error.
    #[must_use]
    pub fn relationship_not_found(
        type_name: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self::RelationshipNotFound {
            type_name: type_name.into(),
            relationship: relationship.into(),
        }
    }

    /// Creates an invalid-query-parameter error.
    #[must_use]
    pub fn invalid_query_parameter(parameter: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidQueryParameter {
            parameter: parameter.into(),
            detail: detail.into(),
        }
    }

    /// Creates an invalid-field error.
    #[must_use]
    pub fn invalid_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid-include error.
    #[must_use]
    pub fn invalid_include(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidInclude {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Creates an invalid-page-parameter error.
    #[must_use]
    pub fn invalid_page_parameter(parameter: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidPageParameter {
            parameter: parameter.into(),
            detail: detail.into(),
        }
    }

    /// Creates a validation error from a single violation.
    #[must_use]
    pub fn validation(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![Violation::new(pointer, message)],
        }
    }

    /// Creates a conflict error pointing at a request-body member.
    #[must_use]
    pub fn conflict(detail: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self::Conflict {
            detail: detail.into(),
            pointer: Some(pointer.into()),
        }
    }

    /// Creates a method-not-allowed error.
    #[must_use]
    pub fn method_not_allowed(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
            target: target.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Attaches a JSON pointer to a resource-not-found error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_source_pointer(self, pointer: impl Into<String>) -> Self {
        match self {
            Self::ResourceNotFound { type_name, id, .. } => Self::ResourceNotFound {
                type_name,
                id,
                source_pointer: Some(pointer.into()),
            },
            other => other,
        }
    }

    /// Returns `true` for the query-parameter family of errors.
    #[must_use]
    pub const fn is_query_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidQueryParameter { .. }
                | Self::InvalidField { .. }
                | Self::InvalidInclude { .. }
                | Self::InvalidPageParameter { .. }
        )
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceTypeNotFound { .. }
            | Self::ResourceNotFound { .. }
            | Self::RelationshipNotFound { .. }
            | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidJson { .. }
            | Self::InvalidQueryParameter { .. }
            | Self::InvalidField { .. }
            | Self::InvalidInclude { .. }
            | Self::InvalidPageParameter { .. }
            | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::ResourceAlreadyExists { .. } | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::DuplicateType { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the short, stable title used in error objects.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::DuplicateType { .. } => "Duplicate Resource Type",
            Self::ResourceTypeNotFound { .. } => "Resource Type Not Found",
            Self::ResourceNotFound { .. } => "Resource Not Found",
            Self::RelationshipNotFound { .. } => "Relationship Not Found",
            Self::ResourceAlreadyExists { .. } => "Resource Already Exists",
            Self::InvalidJson { .. } => "Invalid JSON",
            Self::InvalidQueryParameter { .. } => "Invalid Query Parameter",
            Self::InvalidField { .. } => "Invalid Field",
            Self::InvalidInclude { .. } => "Invalid Include",
            Self::InvalidPageParameter { .. } => "Invalid Page Parameter",
            Self::Validation { .. } => "Validation Error",
            Self::Conflict { .. } => "Conflict",
            Self::MethodNotAllowed { .. } => "Method Not Allowed",
            Self::RouteNotFound { .. } => "Not Found",
            Self::Internal { .. } => "Internal Server Error",
        }
    }

    /// Converts this error into one or more JSON:API error objects.
    ///
    /// Validation errors produce one object per violation. Internal errors
    /// never expose their message.
    #[must_use]
    pub fn to_error_objects(&self) -> Vec<ErrorObject> {
        let status = self.status_code();
        match self {
            Self::Validation { violations } => violations
                .iter()
                .map(|v| {
                    ErrorObject::new(status, self.title())
                        .with_detail(v.message.clone())
                        .with_source(ErrorSource::pointer(v.pointer.clone()))
                })
                .collect(),
            Self::Internal { .. } | Self::DuplicateType { .. } => {
                vec![ErrorObject::new(status, self.title())]
            }
            _ => {
                let object = ErrorObject::new(status, self.title()).with_detail(self.to_string());
                let object = match self.error_source() {
                    Some(source) => object.with_source(source),
                    None => object,
                };
                vec![object]
            }
        }
    }

    fn error_source(&self) -> Option<ErrorSource> {
        match self {
            Self::ResourceNotFound {
                source_pointer: Some(pointer),
                ..
            }
            | Self::Conflict {
                pointer: Some(pointer),
                ..
            } => Some(ErrorSource::pointer(pointer.clone())),
            Self::InvalidQueryParameter { parameter, .. }
            | Self::InvalidPageParameter { parameter, .. } => {
                Some(ErrorSource::parameter(parameter.clone()))
            }
            Self::InvalidField { type_name, .. } => {
                Some(ErrorSource::parameter(format!("fields[{type_name}]")))
            }
            Self::InvalidInclude { .. } => Some(ErrorSource::parameter("include")),
            _ => None,
        }
    }
}

/// Location of the problem an error object describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// JSON pointer into the request document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Name of the offending query parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl ErrorSource {
    /// Creates a source pointing into the request body.
    #[must_use]
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Self {
            pointer: Some(pointer.into()),
            parameter: None,
        }
    }

    /// Creates a source naming a query parameter.
    #[must_use]
    pub fn parameter(parameter: impl Into<String>) -> Self {
        Self {
            pointer: None,
            parameter: Some(parameter.into()),
        }
    }
}

/// A JSON:API error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// The HTTP status code, as a string.
    pub status: String,
    /// Short summary of the problem type.
    pub title: String,
    /// Explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Where the problem is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

impl ErrorObject {
    /// Creates an error object with a status and a title.
    #[must_use]
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            status: status.as_u16().to_string(),
            title: title.into(),
            detail: None,
            source: None,
        }
    }

    /// Sets the detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: ErrorSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Top-level error document: `{"errors": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    /// The collected error objects.
    pub errors: Vec<ErrorObject>,
}

impl ErrorDocument {
    /// Builds an error document from any number of errors.
    #[must_use]
    pub fn from_errors<'a>(errors: impl IntoIterator<Item = &'a JsonApiError>) -> Self {
        Self {
            errors: errors
                .into_iter()
                .flat_map(JsonApiError::to_error_objects)
                .collect(),
        }
    }

    /// Returns the response status for this document.
    ///
    /// This is the status shared by every error object, or 400 when the
    /// objects disagree (or the document is empty).
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let mut statuses = self.errors.iter().map(|e| e.status.as_str());
        let first = match statuses.next() {
            Some(first) => first,
            None => return StatusCode::BAD_REQUEST,
        };
        if statuses.all(|s| s == first) {
            first
                .parse::<u16>()
                .ok()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::BAD_REQUEST)
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl From<&JsonApiError> for ErrorDocument {
    fn from(error: &JsonApiError) -> Self {
        Self::from_errors(std::iter::once(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_statuses() {
        assert_eq!(
            JsonApiError::resource_type_not_found("planets").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            JsonApiError::resource_not_found("books", "99").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            JsonApiError::relationship_not_found("books", "publisher").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_resource_not_found_message() {
        let error = JsonApiError::resource_not_found("books", "99");
        assert_eq!(error.to_string(), "resource 'books' with id '99' not found");

        let error = JsonApiError::ResourceNotFound {
            type_name: "Planet".into(),
            id: None,
            source_pointer: None,
        };
        assert!(error.to_string().contains("no resource registered"));
    }

    #[test]
    fn test_query_parameter_family() {
        assert!(JsonApiError::invalid_field("books", "isbn").is_query_parameter_error());
        assert!(JsonApiError::invalid_include("x", "y").is_query_parameter_error());
        assert!(JsonApiError::invalid_page_parameter("page[size]", "nan").is_query_parameter_error());
        assert!(!JsonApiError::validation("/data", "missing").is_query_parameter_error());
    }

    #[test]
    fn test_method_not_allowed() {
        let error = JsonApiError::method_not_allowed("POST", "books.author");
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_invalid_field_error_object_names_parameter() {
        let objects = JsonApiError::invalid_field("books", "isbn").to_error_objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].status, "400");
        assert_eq!(
            objects[0].source,
            Some(ErrorSource::parameter("fields[books]"))
        );
    }

    #[test]
    fn test_validation_error_objects_one_per_violation() {
        let error = JsonApiError::Validation {
            violations: vec![
                Violation::new("/data/type", "missing required member 'type'"),
                Violation::new("/data/attributes/isbn", "unknown member 'isbn'"),
            ],
        };
        let objects = error.to_error_objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].source, Some(ErrorSource::pointer("/data/attributes/isbn")));
        assert!(error.to_string().contains("/data/type"));
    }

    #[test]
    fn test_internal_error_hides_message() {
        let error = JsonApiError::internal_with_source(
            "database exploded",
            anyhow::anyhow!("connection reset"),
        );
        let objects = error.to_error_objects();
        assert_eq!(objects[0].status, "500");
        assert_eq!(objects[0].detail, None);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_with_source_pointer() {
        let error = JsonApiError::resource_not_found("authors", "7")
            .with_source_pointer("/data/relationships/author/data");
        let objects = error.to_error_objects();
        assert_eq!(
            objects[0].source,
            Some(ErrorSource::pointer("/data/relationships/author/data"))
        );
    }

    #[test]
    fn test_error_document_common_status() {
        let errors = [
            JsonApiError::resource_not_found("books", "1"),
            JsonApiError::resource_not_found("books", "2"),
        ];
        let document = ErrorDocument::from_errors(&errors);
        assert_eq!(document.errors.len(), 2);
        assert_eq!(document.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_document_mixed_status_is_bad_request() {
        let errors = [
            JsonApiError::resource_not_found("books", "1"),
            JsonApiError::method_not_allowed("POST", "books.author"),
        ];
        let document = ErrorDocument::from_errors(&errors);
        assert_eq!(document.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_document_serialization() {
        let error = JsonApiError::invalid_page_parameter("page[size]", "expected a positive integer");
        let json = serde_json::to_value(ErrorDocument::from(&error)).unwrap();
        assert_eq!(json["errors"][0]["status"], "400");
        assert_eq!(json["errors"][0]["title"], "Invalid Page Parameter");
        assert_eq!(json["errors"][0]["source"]["parameter"], "page[size]");
        assert!(json["errors"][0]["source"].get("pointer").is_none());
    }
}
