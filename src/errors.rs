//! Shared error types for the analyzer.
//!
//! Only construction-time and discovery failures are represented here.
//! Anything that goes wrong while analyzing a single file is turned into a
//! [`Violation`](crate::core::Violation) instead, so a batch run always
//! terminates with a result list.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for connascence operations
#[derive(Debug, Error)]
pub enum Error {
    /// One or more invalid configuration values
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigErrors),

    /// File system related errors
    #[error("File system error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bundled Python grammar is incompatible with the tree-sitter runtime
    #[error("Failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// Worker pool could not be created
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Directory traversal errors
    #[error("File discovery failed: {0}")]
    Discovery(#[from] ignore::Error),

    /// Malformed TOML configuration
    #[error("Invalid configuration file: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// A single rejected configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending field, e.g. `thresholds.max_nesting_depth`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every configuration problem found in one validation pass.
///
/// Validation accumulates all issues instead of stopping at the first one,
/// so a user fixing a config file sees the complete list at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigErrors {
    issues: Vec<ConfigIssue>,
}

impl ConfigErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ConfigIssue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns `Ok(())` when nothing was collected.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for ConfigErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_display_joins_all_issues() {
        let mut errors = ConfigErrors::new();
        errors.push(ConfigIssue::new("thresholds.max_call_args", "must be at least 1"));
        errors.push(ConfigIssue::new("cache.memory_capacity", "must be at least 1"));

        let message = Error::from(errors).to_string();
        assert_eq!(
            message,
            "Configuration error: thresholds.max_call_args: must be at least 1; \
             cache.memory_capacity: must be at least 1"
        );
    }

    #[test]
    fn test_empty_config_errors_is_ok() {
        assert!(ConfigErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = Error::io(
            "/missing/file.py",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("/missing/file.py"));
    }
}
