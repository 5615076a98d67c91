//! Test error types.

use hermes_core::JsonApiError;
use thiserror::Error;

/// Errors that can occur while building or reading test requests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// A body could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API under test could not be configured.
    #[error("API setup failed: {0}")]
    Api(#[from] JsonApiError),

    /// The response body is not valid UTF-8.
    #[error("response body is not UTF-8: {0}")]
    BodyRead(#[from] std::string::FromUtf8Error),
}
