//! Batch analysis of many files, sequentially or on a worker pool.
//!
//! # Design
//!
//! Every file goes through the same per-file function whichever mode runs
//! it: read the bytes once, consult the cache, otherwise run the
//! [`UnifiedAnalyzer`] and store the result. Workers share nothing but the
//! immutable configuration; each owns its analyzer and cache handle. The
//! parallel pool builds one worker per thread, on that thread's first file.
//!
//! In parallel mode a dedicated rayon pool runs the files and sends one
//! [`FileOutcome`] per file over a crossbeam channel, so the caller thread
//! collects violations in completion order. A panic while analyzing a file
//! is caught on the worker and turned into a `ProcessingError` for that
//! file; the rest of the batch is unaffected.
//!
//! # Example
//!
//! ```rust,no_run
//! use connascence::analyzers::ParallelAnalyzer;
//! use connascence::config::AnalysisConfig;
//! use std::path::Path;
//!
//! let analyzer = ParallelAnalyzer::new(AnalysisConfig::default())?;
//! let report = analyzer.analyze_path(Path::new("src"))?;
//! println!("{}", report.summary.report());
//! # Ok::<(), connascence::errors::Error>(())
//! ```

use super::unified::UnifiedAnalyzer;
use crate::cache::{resolve_cache_dir, FileCache};
use crate::config::AnalysisConfig;
use crate::core::parsing::processing_error;
use crate::core::{ConnascenceType, SourceParser, Violation, ViolationSummary};
use crate::errors::Result;
use crate::io::FileWalker;
use crate::metrics::{MetricsRecorder, PerformanceMetrics};
use crate::observability::{current_context, set_current_file, set_phase, AnalysisPhase};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Called after each file with `(completed, total, path)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &Path) + Send + Sync>;

/// Requests a batch-level stop. Files already running finish; no new file
/// starts once the flag is set. The flag stays set until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Result of analyzing one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub violations: Vec<Violation>,
    pub lines: usize,
    /// `None` when caching is disabled
    pub cache_hit: Option<bool>,
}

impl FileOutcome {
    fn failed(path: &Path, message: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            violations: vec![processing_error(path, message)],
            lines: 0,
            cache_hit: None,
        }
    }
}

/// Everything a batch produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Violations in completion order
    pub violations: Vec<Violation>,
    pub metrics: PerformanceMetrics,
    pub summary: ViolationSummary,
    /// True when a stop request left files unanalyzed
    pub stopped: bool,
}

impl BatchReport {
    fn new(violations: Vec<Violation>, metrics: PerformanceMetrics, stopped: bool) -> Self {
        let summary = ViolationSummary::from_violations(&violations);
        Self {
            violations,
            metrics,
            summary,
            stopped,
        }
    }

    /// Violations ordered by file, line, column and id.
    pub fn sorted_violations(&self) -> Vec<Violation> {
        let mut sorted = self.violations.clone();
        sorted.sort_by(|a, b| {
            a.file_path()
                .cmp(b.file_path())
                .then(a.line().cmp(&b.line()))
                .then(a.column().cmp(&b.column()))
                .then(a.id().cmp(b.id()))
        });
        sorted
    }
}

/// Per-thread analysis state.
struct Worker {
    analyzer: UnifiedAnalyzer,
    cache: Option<FileCache>,
}

impl Worker {
    fn new(config: &Arc<AnalysisConfig>, cache_dir: Option<&Path>) -> Result<Self> {
        let analyzer = UnifiedAnalyzer::with_shared_config(Arc::clone(config))?;
        let cache = cache_dir.and_then(|dir| {
            FileCache::new(dir, config.cache.memory_capacity)
                .map_err(|err| warn!(error = %err, "result cache unavailable, continuing without it"))
                .ok()
        });
        Ok(Self { analyzer, cache })
    }

    fn analyze(&mut self, path: &Path) -> FileOutcome {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read file");
                return FileOutcome::failed(path, &format!("cannot read file: {err}"));
            }
        };

        if let Some(cache) = self.cache.as_mut() {
            let _phase = set_phase(AnalysisPhase::CacheLookup);
            if let Some(violations) = cache.get_with_bytes(path, &bytes) {
                return FileOutcome {
                    path: path.to_path_buf(),
                    violations,
                    lines: String::from_utf8_lossy(&bytes).lines().count(),
                    cache_hit: Some(true),
                };
            }
        }

        let violations = self.analyzer.analyze_source(path, &bytes);
        let cache_hit = match self.cache.as_mut() {
            Some(cache) => {
                if !violations
                    .iter()
                    .any(|v| v.kind() == ConnascenceType::ProcessingError)
                {
                    cache.set_with_bytes(path, &bytes, &violations);
                }
                Some(false)
            }
            None => None,
        };

        FileOutcome {
            path: path.to_path_buf(),
            violations,
            lines: self.analyzer.last_line_count(),
            cache_hit,
        }
    }

    /// Analyze `path`, turning a panic into a `ProcessingError`.
    fn analyze_isolated(&mut self, path: &Path) -> FileOutcome {
        let _file = set_current_file(path);
        match catch_unwind(AssertUnwindSafe(|| self.analyze(path))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let file = current_context()
                    .current_file
                    .unwrap_or_else(|| path.to_path_buf());
                let message = panic_message(payload.as_ref());
                warn!(path = %file.display(), panic = %message, "analysis panicked");
                FileOutcome::failed(&file, &format!("analysis panicked: {message}"))
            }
        }
    }
}

/// One lazily built [`Worker`] per pool thread, indexed by rayon's thread
/// index. Each slot is only ever locked by its own thread.
struct WorkerSlots<'a> {
    config: &'a Arc<AnalysisConfig>,
    cache_dir: Option<&'a Path>,
    slots: Vec<Mutex<Option<Worker>>>,
}

impl<'a> WorkerSlots<'a> {
    fn new(config: &'a Arc<AnalysisConfig>, cache_dir: Option<&'a Path>, threads: usize) -> Self {
        Self {
            config,
            cache_dir,
            slots: (0..threads.max(1)).map(|_| Mutex::new(None)).collect(),
        }
    }

    fn analyze(&self, path: &Path) -> FileOutcome {
        let index = rayon::current_thread_index().unwrap_or(0) % self.slots.len();
        let mut slot = self.slots[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            match Worker::new(self.config, self.cache_dir) {
                Ok(worker) => *slot = Some(worker),
                Err(err) => return FileOutcome::failed(path, &err.to_string()),
            }
        }
        match slot.as_mut() {
            Some(worker) => worker.analyze_isolated(path),
            None => FileOutcome::failed(path, "worker unavailable"),
        }
    }

    fn built(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Subdirectory keyed by the thresholds, so changing any threshold never
/// serves results computed under the old values.
fn thresholds_key(config: &AnalysisConfig) -> String {
    let encoded = serde_json::to_vec(&config.thresholds).unwrap_or_default();
    let digest = format!("{:x}", Sha256::digest(&encoded));
    format!("v{}-{}", env!("CARGO_PKG_VERSION"), &digest[..12])
}

/// Collects outcomes into violations, metrics and progress reports.
struct Collector<'a> {
    total: usize,
    completed: usize,
    violations: Vec<Violation>,
    recorder: MetricsRecorder,
    progress: Option<&'a ProgressCallback>,
}

impl<'a> Collector<'a> {
    fn new(total: usize, recorder: MetricsRecorder, progress: Option<&'a ProgressCallback>) -> Self {
        Self {
            total,
            completed: 0,
            violations: Vec::new(),
            recorder,
            progress,
        }
    }

    fn push(&mut self, outcome: FileOutcome) {
        self.completed += 1;
        self.recorder.record_file(outcome.lines, outcome.cache_hit);
        debug!(
            path = %outcome.path.display(),
            violations = outcome.violations.len(),
            cache_hit = ?outcome.cache_hit,
            "file complete"
        );
        if let Some(progress) = self.progress {
            progress(self.completed, self.total, &outcome.path);
        }
        self.violations.extend(outcome.violations);
    }

    fn finish(self, stopped: bool) -> BatchReport {
        let stopped = stopped && self.completed < self.total;
        let metrics = self.recorder.finish();
        info!(
            files = metrics.files_analyzed,
            lines = metrics.lines_analyzed,
            violations = self.violations.len(),
            duration_ms = metrics.duration_ms(),
            cache_hit_rate = metrics.cache_hit_rate(),
            workers = metrics.workers,
            parallel = metrics.parallel,
            stopped,
            "batch finished"
        );
        BatchReport::new(self.violations, metrics, stopped)
    }
}

/// Analyzes batches of files with a shared, validated configuration.
pub struct ParallelAnalyzer {
    config: Arc<AnalysisConfig>,
    stop: StopHandle,
    progress: Option<ProgressCallback>,
}

impl ParallelAnalyzer {
    /// Validate `config`; every invalid field is reported at once.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        SourceParser::new()?;
        Ok(Self {
            config: Arc::new(config),
            stop: StopHandle::default(),
            progress: None,
        })
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize, &Path) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Directory holding cached results for the current thresholds, or
    /// `None` when caching is disabled.
    pub fn cache_directory(&self) -> Option<PathBuf> {
        self.config
            .cache
            .enabled
            .then(|| resolve_cache_dir(&self.config.cache).join(thresholds_key(&self.config)))
    }

    /// Remove every cached result for the current thresholds.
    pub fn clear_cache(&self) -> Result<()> {
        if let Some(dir) = self.cache_directory() {
            FileCache::new(dir, self.config.cache.memory_capacity)?.clear();
        }
        Ok(())
    }

    /// Discover Python files under `root` (or take `root` itself when it is
    /// a file) and analyze them.
    pub fn analyze_path(&self, root: &Path) -> Result<BatchReport> {
        let files = {
            let _phase = set_phase(AnalysisPhase::FileDiscovery);
            FileWalker::new(root)
                .with_exclusions(&self.config.exclusions)
                .walk()?
        };
        self.analyze_files(&files)
    }

    /// Analyze `files`, in parallel unless parallelism is disabled or there
    /// is at most one file.
    pub fn analyze_files(&self, files: &[PathBuf]) -> Result<BatchReport> {
        if !self.config.parallel.enabled || files.len() <= 1 {
            self.analyze_sequential(files)
        } else {
            self.analyze_parallel(files)
        }
    }

    pub fn analyze_sequential(&self, files: &[PathBuf]) -> Result<BatchReport> {
        info!(files = files.len(), workers = 1, "starting sequential batch");
        let cache_dir = self.cache_directory();
        let mut worker = Worker::new(&self.config, cache_dir.as_deref())?;
        let mut collector = Collector::new(
            files.len(),
            MetricsRecorder::start(1, false),
            self.progress.as_ref(),
        );

        for path in files {
            if self.stop.is_stopped() {
                break;
            }
            collector.push(worker.analyze_isolated(path));
        }

        Ok(collector.finish(self.stop.is_stopped()))
    }

    pub fn analyze_parallel(&self, files: &[PathBuf]) -> Result<BatchReport> {
        let workers = self.config.parallel.effective_workers();
        info!(files = files.len(), workers, "starting parallel batch");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("connascence-worker-{i}"))
            .build()?;
        let cache_dir = self.cache_directory();
        let (tx, rx) = crossbeam::channel::unbounded::<FileOutcome>();
        let mut collector = Collector::new(
            files.len(),
            MetricsRecorder::start(workers, true),
            self.progress.as_ref(),
        );

        let slots = WorkerSlots::new(&self.config, cache_dir.as_deref(), workers);

        pool.in_place_scope(|scope| {
            let stop = self.stop.clone();
            let slots = &slots;
            scope.spawn(move |_| {
                files.par_iter().for_each(|path| {
                    if stop.is_stopped() {
                        return;
                    }
                    // The receiver outlives the scope.
                    let _ = tx.send(slots.analyze(path));
                });
            });

            for outcome in rx.iter() {
                collector.push(outcome);
            }
        });

        Ok(collector.finish(self.stop.is_stopped()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, ParallelConfig};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn uncached() -> AnalysisConfig {
        AnalysisConfig::default().with_cache(CacheConfig::disabled())
    }

    fn write_files(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("m{i}.py"));
                fs::write(&path, format!("def f{i}(a, b, c, d):\n    return a * 42\n")).unwrap();
                path
            })
            .collect()
    }

    fn ids(report: &BatchReport) -> Vec<String> {
        report
            .sorted_violations()
            .iter()
            .map(|v| v.id().to_string())
            .collect()
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let dir = TempDir::new().unwrap();
        let files = write_files(dir.path(), 6);

        let analyzer = ParallelAnalyzer::new(
            uncached().with_parallel(ParallelConfig::with_workers(3)),
        )
        .unwrap();
        let sequential = analyzer.analyze_sequential(&files).unwrap();
        let parallel = analyzer.analyze_parallel(&files).unwrap();

        assert_eq!(ids(&sequential), ids(&parallel));
        assert_eq!(sequential.violations.len(), 12);
        assert!(parallel.metrics.parallel);
        assert_eq!(parallel.metrics.workers, 3);
    }

    #[test]
    fn test_one_worker_per_pool_thread() {
        let dir = TempDir::new().unwrap();
        let files = write_files(dir.path(), 40);
        let config = Arc::new(uncached());
        let slots = WorkerSlots::new(&config, None, 2);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();

        let outcomes: Vec<FileOutcome> =
            pool.install(|| files.par_iter().map(|path| slots.analyze(path)).collect());

        assert_eq!(outcomes.len(), 40);
        assert!(outcomes.iter().all(|o| o.violations.len() == 2));
        assert!((1..=2).contains(&slots.built()));
    }

    #[test]
    fn test_unreadable_file_isolated() {
        let dir = TempDir::new().unwrap();
        let mut files = write_files(dir.path(), 2);
        files.push(dir.path().join("missing.py"));

        let report = ParallelAnalyzer::new(uncached())
            .unwrap()
            .analyze_files(&files)
            .unwrap();
        assert_eq!(report.summary.count_of(ConnascenceType::ProcessingError), 1);
        assert_eq!(report.summary.count_of(ConnascenceType::Position), 2);
        assert_eq!(report.metrics.files_analyzed, 3);
    }

    #[test]
    fn test_progress_reports_every_file() {
        let dir = TempDir::new().unwrap();
        let files = write_files(dir.path(), 4);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        ParallelAnalyzer::new(uncached())
            .unwrap()
            .with_progress(move |done, total, _path| sink.lock().unwrap().push((done, total)))
            .analyze_files(&files)
            .unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn test_stop_before_start_analyzes_nothing() {
        let dir = TempDir::new().unwrap();
        let files = write_files(dir.path(), 3);
        let analyzer = ParallelAnalyzer::new(uncached()).unwrap();
        analyzer.stop_handle().stop();

        let report = analyzer.analyze_files(&files).unwrap();
        assert!(report.stopped);
        assert!(report.violations.is_empty());
        assert_eq!(report.metrics.files_analyzed, 0);

        analyzer.stop_handle().reset();
        assert!(!analyzer.analyze_files(&files).unwrap().stopped);
    }

    #[test]
    fn test_second_run_hits_cache() {
        let dir = TempDir::new().unwrap();
        let files = write_files(dir.path(), 3);
        let config = AnalysisConfig::default()
            .with_cache(CacheConfig::in_directory(dir.path().join("cache")))
            .with_parallel(ParallelConfig::sequential());
        let analyzer = ParallelAnalyzer::new(config).unwrap();

        let first = analyzer.analyze_files(&files).unwrap();
        let second = analyzer.analyze_files(&files).unwrap();
        assert_eq!(first.metrics.cache_hits, 0);
        assert_eq!(second.metrics.cache_hits, 3);
        assert_eq!(ids(&first), ids(&second));

        analyzer.clear_cache().unwrap();
        let third = analyzer.analyze_files(&files).unwrap();
        assert_eq!(third.metrics.cache_hits, 0);
    }

    #[test]
    fn test_threshold_change_uses_separate_cache() {
        let dir = TempDir::new().unwrap();
        let cache = CacheConfig::in_directory(dir.path().join("cache"));
        let lenient = AnalysisConfig::default().with_cache(cache.clone());
        let mut strict = lenient.clone();
        strict.thresholds.max_positional_params = 1;

        let a = ParallelAnalyzer::new(lenient).unwrap();
        let b = ParallelAnalyzer::new(strict).unwrap();
        assert_ne!(a.cache_directory(), b.cache_directory());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
