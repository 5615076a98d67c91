//! Extraction context providing access to request data.

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Uri};

/// Context providing access to all parts of an HTTP request.
///
/// # Example
///
/// ```rust
/// use hermes_extract::ExtractionContext;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/books/11?include=author"),
///     HeaderMap::new(),
///     Bytes::new(),
/// );
///
/// assert_eq!(ctx.path(), "/books/11");
/// assert_eq!(ctx.query_string(), Some("include=author"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl ExtractionContext {
    /// Creates a new extraction context.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a specific header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request body as bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Checks if the request body is empty (or only whitespace).
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

impl From<Request<Bytes>> for ExtractionContext {
    fn from(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/books")
            .header("content-type", "application/vnd.api+json")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        let ctx = ExtractionContext::from(request);

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.query_string(), None);
        assert_eq!(ctx.header("content-type"), Some("application/vnd.api+json"));
        assert!(!ctx.is_body_empty());
    }

    #[test]
    fn test_whitespace_body_is_empty() {
        let ctx = ExtractionContext::new(
            Method::PATCH,
            Uri::from_static("/books/1"),
            HeaderMap::new(),
            Bytes::from_static(b" \n"),
        );
        assert!(ctx.is_body_empty());
    }
}
