//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use hermes_server::MEDIA_TYPE;
use http::{header, HeaderName, HeaderValue, Method, Request};
use serde::Serialize;

/// Builder for a buffered request to an [`App`](hermes_server::App).
///
/// Query parameters are percent-encoded, so bracketed names such as
/// `fields[books]` can be passed as written.
///
/// # Example
///
/// ```
/// use hermes_test::TestRequest;
///
/// let request = TestRequest::get("/books")
///     .query("fields[books]", "title")
///     .build()
///     .unwrap();
/// assert_eq!(request.uri(), "/books?fields%5Bbooks%5D=title");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Result<Bytes, String>,
}

impl TestRequest {
    /// Starts a request with any method.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Ok(Bytes::new()),
        }
    }

    /// Starts a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Starts a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Starts a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Starts a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Ok(body.into());
        self
    }

    /// Sets a JSON body with the JSON:API media type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.body = serde_json::to_vec(value).map(Bytes::from).map_err(|e| e.to_string());
        self.header(header::CONTENT_TYPE.as_str(), MEDIA_TYPE)
    }

    /// Builds the HTTP request.
    pub fn build(self) -> Result<Request<Bytes>, TestError> {
        let body = self.body.map_err(TestError::RequestBuild)?;
        let uri = if self.query.is_empty() {
            self.path
        } else {
            let query = serde_urlencoded::to_string(&self.query)
                .map_err(|e| TestError::RequestBuild(format!("invalid query: {e}")))?;
            format!("{}?{query}", self.path)
        };

        let mut builder = Request::builder().method(self.method).uri(uri);
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| TestError::RequestBuild(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| TestError::RequestBuild(format!("invalid header value: {e}")))?;
            builder = builder.header(name, value);
        }
        builder.body(body).map_err(|e| TestError::RequestBuild(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_path() {
        let request = TestRequest::get("/books/11").build().unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri(), "/books/11");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_query_is_encoded() {
        let request = TestRequest::get("/authors/1")
            .query("include", "books,books.series")
            .query("page[size]", "2")
            .build()
            .unwrap();
        assert_eq!(
            request.uri(),
            "/authors/1?include=books%2Cbooks.series&page%5Bsize%5D=2"
        );
    }

    #[test]
    fn test_json_body_sets_media_type() {
        let request = TestRequest::post("/series")
            .json(&json!({"data": {"type": "series"}}))
            .build()
            .unwrap();
        assert_eq!(request.headers()[header::CONTENT_TYPE], MEDIA_TYPE);
        assert_eq!(request.body().as_ref(), br#"{"data":{"type":"series"}}"#);
    }

    #[test]
    fn test_invalid_header() {
        let result = TestRequest::get("/books").header("bad header", "x").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }
}
