//! Logging setup and per-thread context for failure reports.
//!
//! ## Usage
//!
//! Install the subscriber once at application startup:
//!
//! ```ignore
//! connascence::observability::init_tracing();
//! ```
//!
//! The filter is read from `CONNASCENCE_LOG`, then `RUST_LOG`, and defaults
//! to `warn`, e.g. `CONNASCENCE_LOG=connascence::cache=debug`.

pub mod context;

pub use context::{
    current_context, set_current_file, set_phase, AnalysisPhase, ContextGuard, TaskContext,
};

use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize tracing output on stderr.
///
/// Idempotent, and leaves an already installed global subscriber in place.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("CONNASCENCE_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .try_init();
    });
}
