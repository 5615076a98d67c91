//! Test client for in-memory JSON:API requests.

use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::TestResponse;
use hermes_core::fixtures::{fantasy_api_with_store, FantasyStore};
use hermes_core::JsonApi;
use hermes_server::App;
use http::Method;
use serde::Serialize;
use std::sync::Arc;

/// Base URL of the APIs built by [`TestClient::fantasy`].
pub const TEST_BASE_URL: &str = "http://example.com";

/// Sends requests straight to an [`App`], without a socket.
///
/// # Example
///
/// ```
/// use hermes_test::TestClient;
/// use http::StatusCode;
///
/// let client = TestClient::fantasy().unwrap();
/// let response = client.get("/books/11").send();
///
/// response.assert_status(StatusCode::OK).assert_media_type();
/// assert_eq!(response.data()["attributes"]["title"], "The Hobbit");
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    app: App,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for an application.
    pub fn new(app: App) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// Creates a client for a configured API.
    pub fn from_api(api: JsonApi) -> Self {
        Self::new(App::new(Arc::new(api)))
    }

    /// A client over a freshly seeded fantasy database.
    pub fn fantasy() -> Result<Self, TestError> {
        Self::fantasy_with_store(&Arc::new(FantasyStore::new()))
    }

    /// A client over the given fantasy store, so a test can inspect it directly.
    pub fn fantasy_with_store(store: &Arc<FantasyStore>) -> Result<Self, TestError> {
        Ok(Self::from_api(fantasy_api_with_store(TEST_BASE_URL, store)?))
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The application under test.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Creates a GET request.
    pub fn get(&self, path: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::GET, path)
    }

    /// Creates a POST request.
    pub fn post(&self, path: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::POST, path)
    }

    /// Creates a PATCH request.
    pub fn patch(&self, path: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, path)
    }

    /// Creates a DELETE request.
    pub fn delete(&self, path: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, path)
    }

    /// Creates a request with any method.
    pub fn request(&self, method: Method, path: impl Into<String>) -> TestClientRequest<'_> {
        let request = self
            .default_headers
            .iter()
            .fold(TestRequest::new(method, path), |request, (name, value)| {
                request.header(name.clone(), value.clone())
            });
        TestClientRequest { client: self, request }
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    request: TestRequest,
}

impl TestClientRequest<'_> {
    /// Appends a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.query(name, value);
        self
    }

    /// Sets a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.request = self.request.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.request = self.request.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub fn send(self) -> TestResponse {
        self.try_send().unwrap_or_else(|e| panic!("failed to send test request: {e}"))
    }

    /// Sends the request, returning build failures.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.request.build()?;
        Ok(self.client.app.handle(request).into())
    }
}
