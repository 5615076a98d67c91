//! # Hermes Extract
//!
//! Everything between the raw HTTP request and the store.
//!
//! ## Extractors
//!
//! | Extractor | Source | Description |
//! |-----------|--------|-------------|
//! | [`QueryParams`] | Query string | Raw parameters, nested one bracket level deep |
//! | [`JsonBody`] | Request body | The body parsed as JSON |
//!
//! Extractors implement [`FromRequest`] over an [`ExtractionContext`], and
//! tuples of extractors are extractors too.
//!
//! ## Parameter resolution
//!
//! [`ParameterResolver`] checks `fields[TYPE]`, `include` and `page[...]`
//! against the resource registry under a per-endpoint [`ParameterPolicy`],
//! producing [`Parameters`](hermes_core::Parameters).
//!
//! ## Document parsing
//!
//! [`RequestParser`] validates create, update and relationship documents and
//! resolves their linkage into model instances.
//!
//! ## Error Handling
//!
//! Every operation fails with [`JsonApiError`](hermes_core::JsonApiError),
//! which renders directly as a JSON:API error document.

#![doc(html_root_url = "https://docs.rs/hermes-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod extractor;
mod parser;
mod query;
mod resolver;

pub use context::ExtractionContext;
pub use extractor::FromRequest;
pub use parser::{LinkageOptions, ParsedResource, RequestParser};
pub use query::{JsonBody, QueryParams};
pub use resolver::{ParameterPolicy, ParameterResolver};
