//! Parallelism configuration for batch analysis.

use serde::{Deserialize, Serialize};

/// Upper bound on the default worker count.
const MAX_DEFAULT_WORKERS: usize = 8;

/// Default value for parallel processing enabled
fn default_enabled() -> bool {
    true
}

/// Configuration for parallel processing operations.
///
/// When enabled, files are analyzed concurrently on a dedicated rayon
/// thread pool. Batches of zero or one file always run sequentially.
///
/// # Example
///
/// ```rust
/// use connascence::config::ParallelConfig;
///
/// let config = ParallelConfig {
///     enabled: true,
///     max_workers: Some(4),
/// };
/// assert_eq!(config.effective_workers(), 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParallelConfig {
    /// Enable parallel processing (default: true)
    ///
    /// When disabled, files are processed sequentially.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Worker thread count (default: available cores, at most 8)
    #[serde(default)]
    pub max_workers: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_workers: None,
        }
    }
}

impl ParallelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with parallel processing disabled.
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_workers(workers: usize) -> Self {
        Self {
            enabled: true,
            max_workers: Some(workers),
        }
    }

    /// Get the effective worker count.
    ///
    /// Returns the configured `max_workers`, or the number of available
    /// CPU cores capped at 8.
    pub fn effective_workers(&self) -> usize {
        self.max_workers
            .unwrap_or_else(|| num_cpus::get().min(MAX_DEFAULT_WORKERS))
            .max(1)
    }
}
