//! # Hermes Server
//!
//! The HTTP side of Hermes:
//!
//! - [`Route`] and [`Operation`]: the JSON:API URL shapes and their methods
//! - [`Controller`]: one method per endpoint, returning an [`Outcome`]
//! - [`App`]: buffered request in, `application/vnd.api+json` response out
//! - [`Server`]: hyper/tokio HTTP/1.1 server with graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hermes_config::ConfigLoader;
//! use hermes_core::fixtures::{fantasy_resources, FantasyStore};
//! use hermes_server::{App, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("HERMES").load()?;
//!     let store = Arc::new(FantasyStore::new());
//!     let api = fantasy_resources(&store)
//!         .into_iter()
//!         .fold(config.api.json_api(), |api, descriptor| api.resource(descriptor))
//!         .build()?;
//!
//!     Server::new(config.server, App::new(Arc::new(api))).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod controller;
pub mod response;
mod routes;
mod server;
pub mod shutdown;

pub use app::App;
pub use controller::{Controller, Outcome};
pub use response::{JsonApiResponse, MEDIA_TYPE};
pub use routes::{Operation, Route};
pub use server::{ResponseBody, Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
