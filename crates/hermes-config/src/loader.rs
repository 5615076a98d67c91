//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, `.env` and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, HermesConfig, LogFormat, PaginationKind};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables, optionally seeded from a `.env` file
///
/// # Example
///
/// ```no_run
/// use hermes_config::ConfigLoader;
///
/// # fn main() -> Result<(), hermes_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("hermes.toml")?
///     .with_dotenv()
///     .with_env_prefix("HERMES")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HermesConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HermesConfig::default(),
            env_prefix: None,
        }
    }

    /// Start over from default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HermesConfig::default();
        self
    }

    /// Start from the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HermesConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HermesConfig::production();
        self
    }

    /// Load configuration from a file; `.toml` and `.json` by extension.
    ///
    /// Sections absent from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::missing_file(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        self.config = match extension.as_deref() {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(path.display().to_string()))
            }
        };
        Ok(self)
    }

    /// Load a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `"toml"` or `"json"` format.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [api]
    ///     base_url = "https://books.example.com"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.api.base_url, "https://books.example.com");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(format.to_string()))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `HERMES__API__BASE_URL` or `HERMES__API__PAGINATION__MAX_SIZE`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file into the environment, if present.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation fails.
    pub fn load(mut self) -> Result<HermesConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: HashMap<String, String> = env::vars()
                .filter(|(key, _)| key.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HermesConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();

        let config = &mut self.config;
        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => config.server.max_body_bytes = parse_number(key, value)?,

            ["API", "BASE_URL"] => config.api.base_url = value.to_string(),
            ["API", "PAGINATION", "STRATEGY"] => {
                config.api.pagination.strategy = match value.to_lowercase().as_str() {
                    "page" => PaginationKind::Page,
                    "offset" => PaginationKind::Offset,
                    _ => return Err(ConfigError::env(key, "expected 'page' or 'offset'")),
                };
            }
            ["API", "PAGINATION", "DEFAULT_SIZE"] => {
                config.api.pagination.default_size = parse_number(key, value)?;
            }
            ["API", "PAGINATION", "MAX_SIZE"] => {
                config.api.pagination.max_size = parse_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => config.logging.include_location = parse_flag(key, value)?,

            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
