//! Query string and body extractors.

use crate::{ExtractionContext, FromRequest};
use hermes_core::{JsonApiError, JsonApiResult, RawParams};
use serde_json::Value;
use std::ops::Deref;

/// The query string, nested one bracket level deep.
///
/// # Example
///
/// ```rust
/// use hermes_core::RawValue;
/// use hermes_extract::{ExtractionContext, FromRequest, QueryParams};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/books?fields%5Bbooks%5D=title&include=author"),
///     HeaderMap::new(),
///     Bytes::new(),
/// );
///
/// let QueryParams(raw) = QueryParams::from_request(&ctx).unwrap();
/// assert_eq!(raw.get("include"), Some(&RawValue::Single("author".into())));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams(pub RawParams);

impl QueryParams {
    /// Consumes the extractor and returns the raw parameters.
    #[must_use]
    pub fn into_inner(self) -> RawParams {
        self.0
    }
}

impl Deref for QueryParams {
    type Target = RawParams;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for QueryParams {
    fn from_request(ctx: &ExtractionContext) -> JsonApiResult<Self> {
        let query = ctx.query_string().unwrap_or("");
        RawParams::parse(query)
            .map(QueryParams)
            .map_err(|e| JsonApiError::invalid_query_parameter("query", e.to_string()))
    }
}

/// The request body parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

impl FromRequest for JsonBody {
    fn from_request(ctx: &ExtractionContext) -> JsonApiResult<Self> {
        if ctx.is_body_empty() {
            return Err(JsonApiError::InvalidJson {
                detail: "request body is empty".to_string(),
            });
        }
        serde_json::from_slice(ctx.body())
            .map(JsonBody)
            .map_err(|e| JsonApiError::InvalidJson {
                detail: e.to_string(),
            })
    }
}
