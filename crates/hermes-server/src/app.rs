//! The request-to-response application.

use std::sync::Arc;

use bytes::Bytes;
use hermes_core::{JsonApi, JsonApiResult};
use hermes_extract::{ExtractionContext, FromRequest, JsonBody, QueryParams};
use http::Request;

use crate::controller::{Controller, Outcome};
use crate::response::{self, JsonApiResponse};
use crate::routes::Route;

/// Maps buffered HTTP requests to JSON:API responses.
///
/// `App` is synchronous and holds only the shared [`JsonApi`], so one
/// instance serves any number of concurrent requests. The [`Server`](crate::Server)
/// runs it on tokio's blocking pool.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bytes::Bytes;
/// use hermes_core::fixtures::fantasy_api;
/// use hermes_server::App;
/// use http::{Request, StatusCode};
///
/// let app = App::new(Arc::new(fantasy_api("http://example.com").unwrap()));
/// let request = Request::get("/books/11").body(Bytes::new()).unwrap();
///
/// let response = app.handle(request);
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.headers()["content-type"], "application/vnd.api+json");
/// ```
#[derive(Debug, Clone)]
pub struct App {
    api: Arc<JsonApi>,
}

impl App {
    /// Creates an application over a configured API.
    #[must_use]
    pub fn new(api: Arc<JsonApi>) -> Self {
        Self { api }
    }

    /// The API this application serves.
    #[must_use]
    pub fn api(&self) -> &JsonApi {
        &self.api
    }

    /// Handles one request. Failures become error documents.
    pub fn handle(&self, request: Request<Bytes>) -> JsonApiResponse {
        let ctx = ExtractionContext::from(request);
        match self.dispatch(&ctx) {
            Ok(outcome) => outcome.into_response(),
            Err(error) => response::error(&error),
        }
    }

    fn dispatch(&self, ctx: &ExtractionContext) -> JsonApiResult<Outcome> {
        let route = Route::parse(ctx.path(), self.api.links().base_path())?;
        let operation = route.operation(ctx.method())?;

        let (raw, body) = if operation.has_body() {
            let (QueryParams(raw), JsonBody(body)) = <(QueryParams, JsonBody)>::from_request(ctx)?;
            (raw, Some(body))
        } else {
            (QueryParams::from_request(ctx)?.into_inner(), None)
        };

        Controller::new(&self.api).dispatch(operation, &route, raw, body.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::fixtures::fantasy_api;
    use http::{Method, StatusCode};
    use serde_json::Value;

    fn app(base_url: &str) -> App {
        App::new(Arc::new(fantasy_api(base_url).unwrap()))
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    fn json(response: &JsonApiResponse) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_base_path_routing() {
        let app = app("http://example.com/api");
        let response = app.handle(request(Method::GET, "/api/books/11", ""));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(&response)["data"]["links"]["self"], "http://example.com/api/books/11");

        let response = app.handle(request(Method::GET, "/books/11", ""));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unknown_type_is_not_found() {
        let response = app("http://example.com").handle(request(Method::GET, "/dragons", ""));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(&response)["errors"][0]["title"], "Resource Type Not Found");
    }

    #[test]
    fn test_method_not_allowed() {
        let response = app("http://example.com").handle(request(Method::PUT, "/books/11", ""));
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_malformed_body() {
        let response = app("http://example.com").handle(request(Method::POST, "/books", "{\"data\":"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(&response)["errors"][0]["title"], "Invalid JSON");
    }

    #[test]
    fn test_get_ignores_body() {
        let response = app("http://example.com").handle(request(Method::GET, "/books/11", "not json"));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
