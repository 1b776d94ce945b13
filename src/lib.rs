//! Connascence analysis for Python code.
//!
//! Each file is parsed once with tree-sitter and walked once; detectors for
//! magic literals, positional coupling, complexity, god objects, duplicated
//! algorithms, name coupling and missing annotations run during that walk.
//! Batches run sequentially or on a rayon pool with a persistent result
//! cache.
//!
//! ```rust,no_run
//! use connascence::{AnalysisConfig, ParallelAnalyzer};
//! use std::path::Path;
//!
//! let analyzer = ParallelAnalyzer::new(AnalysisConfig::default())?;
//! let report = analyzer.analyze_path(Path::new("."))?;
//! for violation in report.sorted_violations() {
//!     println!("{}:{} {}", violation.file_path(), violation.line(), violation.description());
//! }
//! # Ok::<(), connascence::Error>(())
//! ```

pub mod analyzers;
pub mod cache;
pub mod config;
pub mod core;
pub mod detectors;
pub mod errors;
pub mod io;
pub mod metrics;
pub mod observability;

pub use crate::analyzers::{
    analyze_file, BatchReport, ParallelAnalyzer, StopHandle, UnifiedAnalyzer,
};
pub use crate::cache::{CacheStats, FileCache};
pub use crate::config::{
    discover_config, load_config, AnalysisConfig, CacheConfig, ConnascenceThresholds,
    ParallelConfig,
};
pub use crate::core::{
    ConnascenceType, Location, Severity, Violation, ViolationBuilder, ViolationSummary,
};
pub use crate::errors::{ConfigErrors, ConfigIssue, Error, Result};
pub use crate::metrics::PerformanceMetrics;
