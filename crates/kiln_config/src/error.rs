//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a `kiln.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration {path}: {source}")]
    IoError {
        /// The configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// No configuration file exists in the given directory.
    #[error("no kiln.toml, kiln.yaml or kiln.yml found in {0}")]
    NotFound(PathBuf),

    /// The TOML or YAML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("build.compiler".to_string());
        assert_eq!(format!("{err}"), "missing required field: build.compiler");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("source_ext must not start with '.'".to_string());
        assert_eq!(
            format!("{err}"),
            "validation error: source_ext must not start with '.'"
        );
    }

    #[test]
    fn display_io_error_names_path() {
        let err = ConfigError::IoError {
            path: PathBuf::from("proj/kiln.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let display = format!("{err}");
        assert!(display.starts_with("failed to read configuration"));
        assert!(display.contains("kiln.toml"));
    }

    #[test]
    fn display_not_found() {
        let err = ConfigError::NotFound(PathBuf::from("/tmp/empty"));
        assert!(format!("{err}").contains("/tmp/empty"));
    }
}
