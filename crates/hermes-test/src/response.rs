//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use hermes_server::{JsonApiResponse, MEDIA_TYPE};
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A buffered response with JSON:API accessors and assertions.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl From<JsonApiResponse> for TestResponse {
    fn from(response: JsonApiResponse) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

impl TestResponse {
    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers.get(name.as_ref()).and_then(|v| v.to_str().ok())
    }

    /// The `Location` header of a `201 Created` response.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header_str(header::LOCATION.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The body as a JSON document.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn document(&self) -> Value {
        self.json().unwrap_or_else(|e| panic!("response body is not JSON ({e}): {:?}", self.body))
    }

    /// The top-level `data` member.
    #[must_use]
    pub fn data(&self) -> Value {
        self.document()["data"].clone()
    }

    /// The `included` member, empty when absent.
    #[must_use]
    pub fn included(&self) -> Vec<Value> {
        match self.document().get("included") {
            Some(Value::Array(included)) => included.clone(),
            _ => Vec::new(),
        }
    }

    /// The `errors` member, empty when absent.
    #[must_use]
    pub fn errors(&self) -> Vec<Value> {
        match self.document().get("errors") {
            Some(Value::Array(errors)) => errors.clone(),
            _ => Vec::new(),
        }
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {}: {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the response carries the JSON:API media type.
    ///
    /// # Panics
    ///
    /// Panics if `Content-Type` is missing or different.
    pub fn assert_media_type(&self) -> &Self {
        let actual = self.header_str(header::CONTENT_TYPE.as_str());
        assert_eq!(actual, Some(MEDIA_TYPE), "unexpected Content-Type");
        self
    }

    /// Asserts an error document with this status whose first error has this title.
    ///
    /// # Panics
    ///
    /// Panics if the response is not the expected error.
    pub fn assert_error(&self, status: StatusCode, title: &str) -> &Self {
        self.assert_status(status);
        let errors = self.errors();
        assert!(!errors.is_empty(), "expected an error document");
        assert_eq!(errors[0]["status"], status.as_u16().to_string());
        assert_eq!(errors[0]["title"], title);
        self
    }

    /// Asserts a `204 No Content` response with an empty body.
    ///
    /// # Panics
    ///
    /// Panics if the status or body differ.
    pub fn assert_no_content(&self) -> &Self {
        self.assert_status(StatusCode::NO_CONTENT);
        assert!(self.body.is_empty(), "204 response has a body");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Response;

    fn response(status: StatusCode, body: &'static str) -> TestResponse {
        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, MEDIA_TYPE)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
            .into()
    }

    #[test]
    fn test_document_members() {
        let response = response(
            StatusCode::OK,
            r#"{"data": {"type": "books", "id": "11"}, "included": [{"type": "authors", "id": "1"}]}"#,
        );
        response.assert_status(StatusCode::OK).assert_media_type();
        assert_eq!(response.data()["id"], "11");
        assert_eq!(response.included().len(), 1);
        assert!(response.errors().is_empty());
    }

    #[test]
    fn test_assert_error() {
        let response = response(
            StatusCode::NOT_FOUND,
            r#"{"errors": [{"status": "404", "title": "Resource Not Found"}]}"#,
        );
        response.assert_error(StatusCode::NOT_FOUND, "Resource Not Found");
    }

    #[test]
    #[should_panic(expected = "expected status")]
    fn test_assert_status_mismatch() {
        response(StatusCode::OK, "{}").assert_status(StatusCode::CREATED);
    }

    #[test]
    fn test_text() {
        assert_eq!(response(StatusCode::OK, "{}").text().unwrap(), "{}");
    }
}
