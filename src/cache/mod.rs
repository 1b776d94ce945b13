//! Persistent result cache keyed by file contents.

pub mod cache_location;
pub mod file_cache;

pub use cache_location::{default_cache_dir, resolve_cache_dir, CACHE_DIR_ENV};
pub use file_cache::{CacheStats, FileCache};
