//! Main configuration type.
//!
//! This module provides the top-level [`HermesConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ApiConfig, ConfigError, LogFormat, LoggingConfig, ServerConfig};

/// Complete Hermes configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.api.base_url, "http://localhost:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// JSON:API configuration.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HermesConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> HermesConfigBuilder {
        HermesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the server address is not a socket address
    /// - `api.base_url` is not an absolute http(s) URL, or ends with `/`
    /// - the pagination sizes are zero or the default exceeds the maximum
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.socket_addr().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        let base_url = &self.api.base_url;
        let host = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"));
        match host {
            None => {
                return Err(ConfigError::invalid_value(
                    "api.base_url",
                    format!("expected an absolute http(s) URL, got '{base_url}'"),
                ));
            }
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                return Err(ConfigError::invalid_value("api.base_url", "missing host"));
            }
            Some(_) if base_url.ends_with('/') => {
                return Err(ConfigError::invalid_value("api.base_url", "must not end with '/'"));
            }
            Some(_) => {}
        }

        let pagination = &self.api.pagination;
        if pagination.default_size == 0 {
            return Err(ConfigError::invalid_value(
                "api.pagination.default_size",
                "must be greater than 0",
            ));
        }
        if pagination.default_size > pagination.max_size {
            return Err(ConfigError::invalid_value(
                "api.pagination.default_size",
                format!("must not exceed max_size ({})", pagination.max_size),
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    ///
    /// let config = HermesConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs at `info`.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, LogFormat};
    ///
    /// let config = HermesConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.include_location = false;
        config
    }
}

/// Builder for [`HermesConfig`].
#[derive(Debug, Default)]
pub struct HermesConfigBuilder {
    server: Option<ServerConfig>,
    api: Option<ApiConfig>,
    logging: Option<LoggingConfig>,
}

impl HermesConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the API section.
    #[must_use]
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build without validation.
    #[must_use]
    pub fn build(self) -> HermesConfig {
        HermesConfig {
            server: self.server.unwrap_or_default(),
            api: self.api.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build_validated(self) -> Result<HermesConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
