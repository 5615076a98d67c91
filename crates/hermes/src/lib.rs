//! # Hermes
//!
//! **Server-side JSON:API binding**
//!
//! Hermes exposes a set of resource types over HTTP following the
//! [JSON:API](https://jsonapi.org) format:
//!
//! - **Registry** – resource types with attributes, relationships and a store each
//! - **Query parameters** – `include`, `fields[...]` and `page[...]`, validated before any store access
//! - **Serialization** – resource objects, relationship linkage, compound documents and links
//! - **Request parsing** – create, update and relationship bodies checked against a per-type schema
//! - **HTTP** – nine endpoints served by hyper with graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hermes::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("HERMES").load()?;
//!     init_logging(&config.logging.to_log_config())?;
//!
//!     let api = config
//!         .api
//!         .json_api()
//!         .resource(
//!             ResourceDescriptor::builder("books", ModelType::of::<Book>(), store)
//!                 .attributes(["title", "date_published"])
//!                 .to_one("author", "authors")
//!                 .build(),
//!         )
//!         .build()?;
//!
//!     Server::new(config.server, App::new(Arc::new(api))).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request Flow
//!
//! ```text
//! Request → Route → Operation → ParameterResolver → RequestParser → Store
//!                                                                     ↓
//! Response ← ErrorDocument / Document ← Serializer ←─────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Registry, documents, parameters, errors and the store seam
pub use hermes_core as core;

// Query parameter resolution and request body parsing
pub use hermes_extract as extract;

// Document construction
pub use hermes_serializer as serializer;

// Routing, controller and HTTP server
pub use hermes_server as server;

// Layered configuration
pub use hermes_config as config;

// Logging
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use hermes::prelude::*;
///
/// let api = ApiConfig::default().json_api().build().unwrap();
/// assert!(api.registry().is_empty());
/// ```
pub mod prelude {
    pub use hermes_core::{
        Document, FieldValue, Fields, Instance, JsonApi, JsonApiBuilder, JsonApiError,
        JsonApiResult, ModelType, RelationshipDescriptor, Related, ResourceDescriptor, Store,
        StoreError, StoreResult,
    };

    pub use hermes_core::{OffsetLimitStrategy, PageNumberStrategy, PaginationStrategy};

    pub use hermes_extract::{ParameterPolicy, ParameterResolver, RequestParser};

    pub use hermes_serializer::Serializer;

    pub use hermes_server::{App, Controller, Outcome, Server, ShutdownSignal};

    pub use hermes_config::{ApiConfig, ConfigLoader, HermesConfig, ServerConfig};

    pub use hermes_telemetry::{init_logging, LogConfig};
}
