//! # Hermes Telemetry
//!
//! Logging setup for Hermes services.
//!
//! Every Hermes crate emits `tracing` events: the controller opens one span
//! per operation, the server logs bind, shutdown and connection failures.
//! [`init_logging`] installs the subscriber that renders them.
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
