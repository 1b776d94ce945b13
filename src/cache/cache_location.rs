use crate::config::CacheConfig;
use std::path::PathBuf;

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "CONNASCENCE_CACHE_DIR";

/// Platform cache directory for analysis results.
///
/// `CONNASCENCE_CACHE_DIR` wins when set; otherwise `<cache dir>/connascence`
/// (`~/.cache` on Linux, `~/Library/Caches` on macOS, `%LOCALAPPDATA%` on
/// Windows), falling back to the temp directory.
pub fn default_cache_dir() -> PathBuf {
    if let Some(custom) = std::env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(custom);
    }
    dirs::cache_dir()
        .map(|dir| dir.join("connascence"))
        .unwrap_or_else(|| std::env::temp_dir().join("connascence_cache"))
}

/// Directory a cache built from `config` should use.
pub fn resolve_cache_dir(config: &CacheConfig) -> PathBuf {
    config.directory.clone().unwrap_or_else(default_cache_dir)
}
