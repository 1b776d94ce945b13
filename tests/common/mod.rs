// Shared helpers for connascence integration tests
#![allow(dead_code)]

use connascence::{AnalysisConfig, CacheConfig, UnifiedAnalyzer, Violation};
use std::fs;
use std::path::{Path, PathBuf};

/// Analyze an in-memory snippet under `config`.
pub fn analyze_with(config: AnalysisConfig, code: &str) -> Vec<Violation> {
    UnifiedAnalyzer::new(config)
        .unwrap()
        .analyze_source(Path::new("snippet.py"), code.as_bytes())
}

/// Analyze an in-memory snippet under the default configuration.
pub fn analyze_snippet(code: &str) -> Vec<Violation> {
    analyze_with(AnalysisConfig::default(), code)
}

/// Configuration without the on-disk cache.
pub fn uncached_config() -> AnalysisConfig {
    AnalysisConfig::default().with_cache(CacheConfig::disabled())
}

pub fn write_py(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Ids sorted, for multiset comparison.
pub fn sorted_ids(violations: &[Violation]) -> Vec<String> {
    let mut ids: Vec<String> = violations.iter().map(|v| v.id().to_string()).collect();
    ids.sort();
    ids
}

/// A module with one violation of several kinds.
pub fn mixed_module(tag: usize) -> String {
    format!(
        "TIMEOUT = 30\n\
         \n\
         def configure_{tag}(host, port, user, password_hint):\n    \
             return host\n\
         \n\
         def wait_{tag}(seconds):\n    \
             if seconds > 45:\n        \
                 return seconds * 3.5\n    \
             return seconds\n"
    )
}
