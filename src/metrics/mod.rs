//! Batch performance metrics.

pub mod performance;

pub use performance::{MetricsRecorder, PerformanceMetrics};
