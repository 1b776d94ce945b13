//! Thread-local context tracking for failure reports.
//!
//! Each worker thread records the phase and file it is working on. When
//! analysis of a file panics, the batch layer reads this context to name
//! the file and phase in the resulting `ProcessingError`.
//!
//! Context guards use RAII, so the previous context is restored on drop
//! even while unwinding.

use std::cell::RefCell;
use std::path::PathBuf;

thread_local! {
    static CURRENT_CONTEXT: RefCell<TaskContext> = const { RefCell::new(TaskContext::new()) };
}

/// Context snapshot for the current analysis operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContext {
    pub phase: Option<AnalysisPhase>,
    pub current_file: Option<PathBuf>,
}

impl TaskContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
        }
    }
}

/// Stages of analyzing one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// Discovering files to analyze
    FileDiscovery,
    /// Looking up cached results
    CacheLookup,
    /// Parsing source into a syntax tree
    Parsing,
    /// Running detectors during the traversal
    Detection,
    /// Duplicate and name post-passes
    Resolution,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileDiscovery => write!(f, "file_discovery"),
            Self::CacheLookup => write!(f, "cache_lookup"),
            Self::Parsing => write!(f, "parsing"),
            Self::Detection => write!(f, "detection"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// RAII guard for restoring analysis context on drop.
pub struct ContextGuard {
    previous: TaskContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

/// Set the current analysis phase.
///
/// Returns a guard that restores the previous phase on drop.
#[must_use]
pub fn set_phase(phase: AnalysisPhase) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        ctx.borrow_mut().phase = Some(phase);
        ContextGuard { previous }
    })
}

/// Set the current file being analyzed.
///
/// ```
/// use connascence::observability::{current_context, set_current_file};
///
/// {
///     let _file = set_current_file("pkg/module.py");
///     assert!(current_context().current_file.is_some());
/// }
/// assert!(current_context().current_file.is_none());
/// ```
#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        ctx.borrow_mut().current_file = Some(path.into());
        ContextGuard { previous }
    })
}

/// Get the current context snapshot for this thread.
#[must_use]
pub fn current_context() -> TaskContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}
