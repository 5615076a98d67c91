//! Core extractor trait.

use crate::ExtractionContext;
use hermes_core::JsonApiResult;

/// Trait for types that can be extracted from an HTTP request.
///
/// # Implementing `FromRequest`
///
/// ```rust
/// use hermes_core::{JsonApiError, JsonApiResult};
/// use hermes_extract::{ExtractionContext, FromRequest};
///
/// struct Accept(String);
///
/// impl FromRequest for Accept {
///     fn from_request(ctx: &ExtractionContext) -> JsonApiResult<Self> {
///         ctx.header("accept")
///             .map(|value| Accept(value.to_string()))
///             .ok_or_else(|| JsonApiError::internal("no accept header"))
///     }
/// }
/// ```
pub trait FromRequest: Sized {
    /// Extracts this type from the request context.
    fn from_request(ctx: &ExtractionContext) -> JsonApiResult<Self>;
}

macro_rules! impl_from_request_for_tuple {
    ($($T:ident),*) => {
        impl<$($T: FromRequest),*> FromRequest for ($($T,)*) {
            fn from_request(ctx: &ExtractionContext) -> JsonApiResult<Self> {
                Ok(($($T::from_request(ctx)?,)*))
            }
        }
    };
}

impl_from_request_for_tuple!(T1, T2);
impl_from_request_for_tuple!(T1, T2, T3);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonBody, QueryParams};
    use bytes::Bytes;
    use hermes_core::JsonApiError;
    use http::{HeaderMap, Method, Uri};

    #[test]
    fn test_tuple_extraction() {
        let ctx = ExtractionContext::new(
            Method::POST,
            Uri::from_static("/books?include=author"),
            HeaderMap::new(),
            Bytes::from_static(br#"{"data": null}"#),
        );
        let (QueryParams(raw), JsonBody(body)) =
            <(QueryParams, JsonBody)>::from_request(&ctx).unwrap();
        assert!(raw.contains("include"));
        assert!(body["data"].is_null());
    }

    #[test]
    fn test_tuple_extraction_stops_at_first_error() {
        let ctx = ExtractionContext::new(
            Method::POST,
            Uri::from_static("/books"),
            HeaderMap::new(),
            Bytes::new(),
        );
        let error = <(QueryParams, JsonBody)>::from_request(&ctx).unwrap_err();
        assert!(matches!(error, JsonApiError::InvalidJson { .. }));
    }
}
