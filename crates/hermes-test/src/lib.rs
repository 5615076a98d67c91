//! # Hermes Test
//!
//! In-memory testing for Hermes APIs. Requests go straight to an
//! [`App`](hermes_server::App), with no socket or runtime involved.
//!
//! - [`TestClient`]: request builders bound to an application
//! - [`TestRequest`]: percent-encodes query parameters such as `fields[books]`
//! - [`TestResponse`]: JSON:API accessors (`data`, `included`, `errors`) and assertions
//!
//! ## Example
//!
//! ```
//! use hermes_test::TestClient;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let client = TestClient::fantasy().unwrap();
//!
//! let response = client
//!     .get("/books/11")
//!     .query("fields[books]", "title,author")
//!     .send();
//! response.assert_status(StatusCode::OK);
//! assert_eq!(response.data()["attributes"], json!({"title": "The Hobbit"}));
//!
//! client
//!     .post("/books/11/relationships/author")
//!     .json(&json!({"data": {"type": "authors", "id": "2"}}))
//!     .send()
//!     .assert_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, TEST_BASE_URL};
pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
