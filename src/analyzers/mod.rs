//! Per-file and batch analysis drivers.

pub mod batch;
pub mod context;
pub mod unified;

pub use batch::{BatchReport, FileOutcome, ParallelAnalyzer, ProgressCallback, StopHandle};
pub use context::{AnalysisContext, Scope};
pub use unified::UnifiedAnalyzer;

use crate::config::AnalysisConfig;
use crate::core::Violation;
use crate::errors::Result;
use std::path::Path;

/// Analyze a single file with `config`.
///
/// Convenience for one-off use; reuse a [`UnifiedAnalyzer`] when analyzing
/// many files.
pub fn analyze_file(path: &Path, config: AnalysisConfig) -> Result<Vec<Violation>> {
    Ok(UnifiedAnalyzer::new(config)?.analyze_file(path))
}
