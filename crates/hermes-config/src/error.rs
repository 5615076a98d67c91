//! Errors raised while loading a [`HermesConfig`](crate::HermesConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration layer could not be applied, or the merged result is invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was given a path that does not exist.
    #[error("no configuration file at {path}")]
    MissingFile {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {path}")]
    Read {
        /// The file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file or string is not a format the loader understands.
    #[error("unsupported configuration format '{0}', expected toml or json")]
    UnsupportedFormat(String),

    /// Malformed TOML, or TOML with unknown keys.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or JSON with unknown keys.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A `HERMES__*` variable has a bad key or value.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The merged configuration breaks a constraint, e.g. a `base_url`
    /// ending in `/` or a pagination default above its maximum.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending setting.
        field: String,
        /// The violated constraint.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// A constraint violation on `field`.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_path() {
        let err = ConfigError::missing_file("/etc/hermes/hermes.toml");
        assert_eq!(err.to_string(), "no configuration file at /etc/hermes/hermes.toml");
    }

    #[test]
    fn test_read_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read("hermes.toml", io);
        assert!(err.source().is_some_and(|source| source.to_string() == "denied"));
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigError::invalid_value("api.base_url", "must not end with '/'");
        assert_eq!(err.to_string(), "api.base_url: must not end with '/'");
    }

    #[test]
    fn test_env_message() {
        let err = ConfigError::env("HERMES__API__PAGINATION__MAX_SIZE", "expected integer");
        assert_eq!(
            err.to_string(),
            "environment variable HERMES__API__PAGINATION__MAX_SIZE: expected integer"
        );
    }
}
