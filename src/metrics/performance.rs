//! Timing and throughput figures for one analysis batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub files_analyzed: usize,
    pub lines_analyzed: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub workers: usize,
    pub parallel: bool,
}

impl PerformanceMetrics {
    /// Wall-clock duration, never negative.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from((self.end - self.start).num_milliseconds()).unwrap_or(0)
    }

    /// Lines per second, treating durations below 1 ms as 1 ms.
    pub fn lines_per_second(&self) -> f64 {
        let seconds = self.duration_ms().max(1) as f64 / 1000.0;
        self.lines_analyzed as f64 / seconds
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = (self.cache_hits + self.cache_misses).max(1);
        self.cache_hits as f64 / lookups as f64
    }

    /// How many times faster this batch ran than `baseline`.
    pub fn speedup_over(&self, baseline: &PerformanceMetrics) -> f64 {
        baseline.duration_ms().max(1) as f64 / self.duration_ms().max(1) as f64
    }
}

impl std::fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files, {} lines in {} ms ({:.0} lines/s, {} workers, {:.1}% cache hits)",
            self.files_analyzed,
            self.lines_analyzed,
            self.duration_ms(),
            self.lines_per_second(),
            self.workers,
            self.cache_hit_rate() * 100.0
        )
    }
}

/// Accumulates per-file figures while a batch runs.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    start: DateTime<Utc>,
    files_analyzed: usize,
    lines_analyzed: usize,
    cache_hits: usize,
    cache_misses: usize,
    workers: usize,
    parallel: bool,
}

impl MetricsRecorder {
    pub fn start(workers: usize, parallel: bool) -> Self {
        Self {
            start: Utc::now(),
            files_analyzed: 0,
            lines_analyzed: 0,
            cache_hits: 0,
            cache_misses: 0,
            workers,
            parallel,
        }
    }

    /// Record one finished file. `cache_hit` is `None` when caching is off.
    pub fn record_file(&mut self, lines: usize, cache_hit: Option<bool>) {
        self.files_analyzed += 1;
        self.lines_analyzed += lines;
        match cache_hit {
            Some(true) => self.cache_hits += 1,
            Some(false) => self.cache_misses += 1,
            None => {}
        }
    }

    pub fn finish(self) -> PerformanceMetrics {
        PerformanceMetrics {
            start: self.start,
            end: Utc::now(),
            files_analyzed: self.files_analyzed,
            lines_analyzed: self.lines_analyzed,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            workers: self.workers,
            parallel: self.parallel,
        }
    }
}
