//! Analysis configuration.
//!
//! One immutable [`AnalysisConfig`] value is built up front (defaults, a TOML
//! file, or code), validated once, and then shared read-only with every
//! detector and worker.

mod loader;
mod parallel;
mod thresholds;
mod validation;

pub use loader::{directory_ancestors, discover_config, load_config, CONFIG_FILE_NAME};
pub use parallel::ParallelConfig;
pub use thresholds::ConnascenceThresholds;
pub use validation::validate_config;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Patterns excluded from directory discovery unless overridden.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "__pycache__/",
    ".pytest_cache/",
    ".mypy_cache/",
    ".git/",
    "venv*/",
    ".venv/",
    "env/",
    "node_modules/",
    "build/",
    "dist/",
    "*.egg-info/",
    "tests/",
    "test_*",
    "*_test.py",
    "conftest.py",
];

fn default_exclusions() -> Vec<String> {
    DEFAULT_EXCLUSIONS.iter().map(|p| p.to_string()).collect()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_memory_capacity() -> usize {
    1000
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Cache directory; the platform cache directory when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Entries kept in the in-memory tier
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            directory: None,
            memory_capacity: default_memory_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub thresholds: ConnascenceThresholds,

    #[serde(default)]
    pub parallel: ParallelConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Path patterns skipped during discovery
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: ConnascenceThresholds::default(),
            parallel: ParallelConfig::default(),
            cache: CacheConfig::default(),
            exclusions: default_exclusions(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(contents: &str) -> crate::errors::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, reporting all invalid values together.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigErrors> {
        validate_config(self)
    }

    pub fn with_thresholds(mut self, thresholds: ConnascenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }
}
