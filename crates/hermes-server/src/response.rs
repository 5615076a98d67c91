//! JSON:API response construction.
//!
//! Every response carries `Content-Type: application/vnd.api+json`, including
//! error documents and empty `204` replies.

use bytes::Bytes;
use hermes_core::{Document, ErrorDocument, ErrorObject, JsonApiError};
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Response, StatusCode};
use serde::Serialize;

/// The JSON:API media type.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Response type produced by [`App`](crate::App).
pub type JsonApiResponse = Response<Bytes>;

/// `200 OK` with a document.
#[must_use]
pub fn ok(document: &Document) -> JsonApiResponse {
    with_body(StatusCode::OK, document, None)
}

/// `201 Created` with a document and a `Location` header.
#[must_use]
pub fn created(document: &Document, location: &str) -> JsonApiResponse {
    with_body(StatusCode::CREATED, document, Some(location))
}

/// `204 No Content`.
#[must_use]
pub fn no_content() -> JsonApiResponse {
    build(StatusCode::NO_CONTENT, Bytes::new(), None)
}

/// Converts an error into an error document response.
///
/// Client errors are logged at `debug`, server errors at `error`.
#[must_use]
pub fn error(error: &JsonApiError) -> JsonApiResponse {
    errors(std::slice::from_ref(error))
}

/// Folds several errors into one document; the status is their common
/// status, or `400` when they disagree.
#[must_use]
pub fn errors(errors: &[JsonApiError]) -> JsonApiResponse {
    for error in errors {
        if error.status_code().is_server_error() {
            tracing::error!(error = %error, source = ?std::error::Error::source(error), "request failed");
        } else {
            tracing::debug!(error = %error, status = error.status_code().as_u16(), "request rejected");
        }
    }

    let document = ErrorDocument::from_errors(errors);
    let status = document.status();
    match serde_json::to_vec(&document) {
        Ok(body) => build(status, Bytes::from(body), None),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize error document");
            internal_error()
        }
    }
}

/// An error raised by the transport before a request reaches the
/// controller, such as an oversized or slow body.
#[must_use]
pub fn transport_error(status: StatusCode, title: &str, detail: &str) -> JsonApiResponse {
    let document = ErrorDocument {
        errors: vec![ErrorObject::new(status, title).with_detail(detail)],
    };
    match serde_json::to_vec(&document) {
        Ok(body) => build(status, Bytes::from(body), None),
        Err(_) => internal_error(),
    }
}

fn with_body<T: Serialize>(status: StatusCode, value: &T, location: Option<&str>) -> JsonApiResponse {
    match serde_json::to_vec(value) {
        Ok(body) => build(status, Bytes::from(body), location),
        Err(e) => error(&JsonApiError::internal_with_source("failed to serialize document", e)),
    }
}

fn build(status: StatusCode, body: Bytes, location: Option<&str>) -> JsonApiResponse {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
    if let Some(location) = location {
        builder = builder.header(LOCATION, location);
    }
    builder.body(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build response");
        internal_error()
    })
}

/// A bare `500` that cannot fail to build.
fn internal_error() -> JsonApiResponse {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::PrimaryData;
    use serde_json::Value;

    fn body_json(response: &JsonApiResponse) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_ok_sets_media_type() {
        let response = ok(&Document::new(PrimaryData::Null));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], MEDIA_TYPE);
        assert_eq!(body_json(&response), serde_json::json!({"data": null}));
    }

    #[test]
    fn test_created_sets_location() {
        let response = created(&Document::new(PrimaryData::Null), "http://example.com/books/12");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[LOCATION], "http://example.com/books/12");
    }

    #[test]
    fn test_no_content() {
        let response = no_content();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert_eq!(response.headers()[CONTENT_TYPE], MEDIA_TYPE);
    }

    #[test]
    fn test_error_document() {
        let response = error(&JsonApiError::resource_not_found("books", "99"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(&response);
        assert_eq!(body["errors"][0]["status"], "404");
        assert_eq!(body["errors"][0]["title"], "Resource Not Found");
    }

    #[test]
    fn test_mixed_errors_fold_to_bad_request() {
        let response = errors(&[
            JsonApiError::resource_not_found("books", "99"),
            JsonApiError::method_not_allowed("POST", "/books/1/relationships/author"),
        ]);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_transport_error() {
        let response = transport_error(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large", "body exceeds 16 bytes");
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(&response);
        assert_eq!(body["errors"][0]["title"], "Payload Too Large");
        assert_eq!(body["errors"][0]["detail"], "body exceeds 16 bytes");
    }

    #[test]
    fn test_invalid_location_degrades_to_500() {
        let response = created(&Document::new(PrimaryData::Null), "bad\nheader");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
