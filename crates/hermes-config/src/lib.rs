//! Typed configuration for Hermes.
//!
//! This crate loads the settings a Hermes deployment needs with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides, optionally seeded from `.env`
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`HermesConfig`] groups three sections:
//!
//! - [`ServerConfig`] - bind address, timeouts and body limit
//! - [`ApiConfig`] - the base URL for generated links and [`PaginationConfig`]
//! - [`LoggingConfig`] - log level and output format
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! println!("links start with {}", config.api.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 1048576
//!
//! [api]
//! base_url = "https://books.example.com"
//!
//! [api.pagination]
//! strategy = "page"
//! default_size = 20
//! max_size = 100
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form `PREFIX__SECTION__KEY`:
//!
//! - `HERMES__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `HERMES__API__BASE_URL=https://books.example.com`
//! - `HERMES__API__PAGINATION__STRATEGY=offset`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HermesConfig::default();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
        assert_eq!(config.api.pagination.strategy, PaginationKind::Page);
    }

    #[test]
    fn test_config_builder() {
        let config = HermesConfig::builder()
            .server(ServerConfig {
                http_addr: "127.0.0.1:3000".to_string(),
                ..Default::default()
            })
            .build();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.logging.level, "info");
    }
}
