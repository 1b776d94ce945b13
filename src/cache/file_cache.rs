//! Two-tier cache of per-file violation lists.
//!
//! Entries are keyed by file name plus a fingerprint of the path as given,
//! the file's bytes, modification time and size, so any edit, touch, move or
//! different spelling of the path misses. Violations carry the path they
//! were found under, so an entry is only ever served for that exact path. The
//! memory tier is a bounded FIFO; the disk tier is a directory of JSON files
//! written by whole-entry replacement (temp file + rename), which makes it
//! safe to share between workers without locks. Disk failures never surface
//! to callers: they are logged and treated as misses.

use crate::core::Violation;
use crate::errors::{Error, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;
use tracing::debug;

/// On-disk cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    file_path: String,
    created: DateTime<Utc>,
    violations: Vec<Violation>,
}

#[derive(Debug)]
pub struct FileCache {
    directory: PathBuf,
    capacity: usize,
    memory: HashMap<String, Vec<Violation>>,
    order: VecDeque<String>,
    hits: usize,
    misses: usize,
}

impl FileCache {
    /// Open (and create if needed) a cache rooted at `directory`, keeping at
    /// most `capacity` entries in memory.
    pub fn new(directory: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| Error::io(&directory, e))?;
        Ok(Self {
            directory,
            capacity: capacity.max(1),
            memory: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Cached violations for the current contents of `path`.
    pub fn get(&mut self, path: &Path) -> Option<Vec<Violation>> {
        match fs::read(path) {
            Ok(bytes) => self.get_with_bytes(path, &bytes),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "cache lookup could not read file");
                self.misses += 1;
                None
            }
        }
    }

    /// Like [`get`](Self::get) for bytes the caller has already read.
    pub fn get_with_bytes(&mut self, path: &Path, bytes: &[u8]) -> Option<Vec<Violation>> {
        let Some(key) = entry_key(path, bytes) else {
            self.misses += 1;
            return None;
        };

        if let Some(violations) = self.memory.get(&key) {
            self.hits += 1;
            debug!(key = %key, "memory cache hit");
            return Some(violations.clone());
        }

        match self.read_entry(&key, path) {
            Ok(Some(violations)) => {
                self.hits += 1;
                debug!(key = %key, "disk cache hit");
                self.remember(key, violations.clone());
                Some(violations)
            }
            Ok(None) => {
                self.misses += 1;
                None
            }
            Err(err) => {
                debug!(key = %key, error = %format!("{err:#}"), "discarding unreadable cache entry");
                let _ = fs::remove_file(self.entry_path(&key));
                self.misses += 1;
                None
            }
        }
    }

    /// Store the violations found for the current contents of `path`.
    pub fn set(&mut self, path: &Path, violations: &[Violation]) {
        match fs::read(path) {
            Ok(bytes) => self.set_with_bytes(path, &bytes, violations),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "not caching unreadable file");
            }
        }
    }

    pub fn set_with_bytes(&mut self, path: &Path, bytes: &[u8], violations: &[Violation]) {
        let Some(key) = entry_key(path, bytes) else {
            return;
        };
        if let Err(err) = self.write_entry(&key, path, violations) {
            debug!(key = %key, error = %format!("{err:#}"), "cache write failed");
        }
        self.remember(key, violations.to_vec());
    }

    /// Drop every entry from both tiers and reset the counters.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;

        let Ok(entries) = fs::read_dir(&self.directory) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Err(err) = fs::remove_file(&path) {
                    debug!(path = %path.display(), error = %err, "failed to remove cache entry");
                }
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            entries: self.memory.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if lookups > 0 {
                self.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }

    fn remember(&mut self, key: String, violations: Vec<Violation>) {
        if self.memory.insert(key.clone(), violations).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.memory.remove(&oldest);
            }
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }

    fn read_entry(&self, key: &str, source: &Path) -> anyhow::Result<Option<Vec<Violation>>> {
        let path = self.entry_path(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        };
        let entry: CacheEntry = serde_json::from_slice(&data)
            .with_context(|| format!("decoding {}", path.display()))?;
        if entry.file_path != source.to_string_lossy() {
            debug!(key = %key, cached = %entry.file_path, "cache entry recorded for another path");
            return Ok(None);
        }
        Ok(Some(entry.violations))
    }

    fn write_entry(&self, key: &str, source: &Path, violations: &[Violation]) -> anyhow::Result<()> {
        let entry = CacheEntry {
            file_path: source.to_string_lossy().into_owned(),
            created: Utc::now(),
            violations: violations.to_vec(),
        };
        let data = serde_json::to_vec(&entry).context("encoding cache entry")?;

        let target = self.entry_path(key);
        let temp = temp_path_for(&target);
        fs::write(&temp, &data).with_context(|| format!("writing {}", temp.display()))?;
        if let Err(err) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(err)
                .with_context(|| format!("renaming {} -> {}", temp.display(), target.display()));
        }
        Ok(())
    }
}

/// `<file-name>_<fingerprint>`, or `None` when the file's metadata is
/// unavailable.
fn entry_key(path: &Path, bytes: &[u8]) -> Option<String> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update([0u8]);
    hasher.update(bytes);
    hasher.update(modified.to_le_bytes());
    hasher.update(metadata.len().to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace(['.', ' '], "_"))
        .unwrap_or_else(|| "file".to_string());
    Some(format!("{name}_{}", &digest[..16]))
}

fn temp_path_for(target: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("entry");
    target.with_file_name(format!("{name}.tmp.{}.{counter}", std::process::id()))
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache Stats: {} entries, {} hits, {} misses, {:.1}% hit rate",
            self.entries,
            self.hits,
            self.misses,
            self.hit_rate * 100.0
        )
    }
}
