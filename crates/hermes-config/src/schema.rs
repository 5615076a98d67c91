//! Configuration sections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hermes_core::{JsonApi, JsonApiBuilder, OffsetLimitStrategy, PageNumberStrategy, PaginationStrategy};
use hermes_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// HTTP server settings.
///
/// # Example
///
/// ```
/// use hermes_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.socket_addr().unwrap().port(), 3000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Request timeout in milliseconds, covering body collection and handling.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// The graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// The per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

const fn default_shutdown_timeout() -> u64 {
    30
}

const fn default_request_timeout() -> u64 {
    30_000
}

const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Which `page[...]` keys the API understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaginationKind {
    /// `page[number]` and `page[size]`.
    #[default]
    Page,
    /// `page[offset]` and `page[limit]`.
    Offset,
}

/// Pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Strategy.
    #[serde(default)]
    pub strategy: PaginationKind,

    /// Page size when the request names none.
    #[serde(default = "default_page_size")]
    pub default_size: usize,

    /// Largest page size a client may ask for.
    #[serde(default = "default_max_page_size")]
    pub max_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            strategy: PaginationKind::default(),
            default_size: default_page_size(),
            max_size: default_max_page_size(),
        }
    }
}

impl PaginationConfig {
    /// Builds the configured strategy.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{PaginationConfig, PaginationKind};
    ///
    /// let config = PaginationConfig { strategy: PaginationKind::Offset, ..Default::default() };
    /// assert_eq!(config.strategy().keys(), &["offset", "limit"]);
    /// ```
    #[must_use]
    pub fn strategy(&self) -> Arc<dyn PaginationStrategy> {
        match self.strategy {
            PaginationKind::Page => Arc::new(PageNumberStrategy::new(self.default_size, self.max_size)),
            PaginationKind::Offset => Arc::new(OffsetLimitStrategy::new(self.default_size, self.max_size)),
        }
    }
}

const fn default_page_size() -> usize {
    20
}

const fn default_max_page_size() -> usize {
    100
}

/// JSON:API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Absolute URL every generated link starts with.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Pagination.
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Starts a [`JsonApi`] rooted at `base_url` with the configured pagination.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::ApiConfig;
    ///
    /// let api = ApiConfig::default().json_api().build().unwrap();
    /// assert_eq!(api.pagination().keys(), &["number", "size"]);
    /// ```
    pub fn json_api(&self) -> JsonApiBuilder {
        JsonApi::builder(self.base_url.clone()).pagination_arc(self.pagination.strategy())
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error) or a filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts into the telemetry crate's configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: self.format == LogFormat::Pretty,
            file_line_info: self.include_location,
            ..LogConfig::default()
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_pagination_strategy() {
        let page = PaginationConfig::default().strategy();
        assert_eq!(page.keys(), &["number", "size"]);

        let offset = PaginationConfig {
            strategy: PaginationKind::Offset,
            default_size: 5,
            max_size: 10,
        }
        .strategy();
        let pagination = offset.parse(None).unwrap();
        assert_eq!(pagination.limit(), 5);
    }

    #[test]
    fn test_json_api_uses_config() {
        let config = ApiConfig {
            base_url: "https://books.example.com".to_string(),
            pagination: PaginationConfig {
                strategy: PaginationKind::Offset,
                ..Default::default()
            },
        };
        let api = config.json_api().build().unwrap();
        assert_eq!(api.links().collection("books"), "https://books.example.com/books");
        assert_eq!(api.pagination().keys(), &["offset", "limit"]);
    }

    #[test]
    fn test_logging_conversion() {
        let log = LoggingConfig {
            format: LogFormat::Pretty,
            level: "debug".to_string(),
            include_location: true,
            ..Default::default()
        }
        .to_log_config();
        assert!(!log.json_format);
        assert!(log.file_line_info);
        assert_eq!(log.level, "debug");
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: ApiConfig = toml::from_str(
            r#"
            base_url = "https://books.example.com/api"

            [pagination]
            strategy = "offset"
            "#,
        )
        .unwrap();
        assert_eq!(config.pagination.strategy, PaginationKind::Offset);
        assert_eq!(config.pagination.max_size, 100);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result: Result<PaginationConfig, _> = toml::from_str(r#"strategy = "cursor""#);
        assert!(result.is_err());
    }
}
