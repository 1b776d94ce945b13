//! Discovery of Python source files under a root directory.

use crate::errors::{Error, Result};
use glob::Pattern;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// One compiled exclusion pattern.
#[derive(Debug, Clone)]
enum Exclusion {
    /// `name/`: any directory component matching the glob.
    Directory(Pattern),
    /// Contains a wildcard: matched against the relative path and file name.
    Glob(Pattern),
    /// Plain text anywhere in the relative path.
    Substring(String),
}

impl Exclusion {
    fn parse(raw: &str) -> Option<Self> {
        if let Some(dir) = raw.strip_suffix('/') {
            return Pattern::new(dir).ok().map(Self::Directory);
        }
        if raw.contains(['*', '?', '[']) {
            return Pattern::new(raw).ok().map(Self::Glob);
        }
        Some(Self::Substring(raw.to_string()))
    }
}

/// Compiled exclusion set applied to paths relative to the walk root.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Exclusion>,
}

impl ExclusionSet {
    /// Compile `patterns`. Patterns that fail to compile are skipped; the
    /// configuration validator reports them before a walk starts.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .filter_map(|p| Exclusion::parse(p.as_ref()))
                .collect(),
        }
    }

    /// True when `relative` (a path below the walk root) is excluded.
    /// `is_dir` tells whether the last component is itself a directory.
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        let text = relative.to_string_lossy();
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        let mut dirs: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect();
        if !is_dir {
            dirs.pop();
        }

        self.patterns.iter().any(|pattern| match pattern {
            Exclusion::Directory(glob) => dirs.iter().any(|d| glob.matches(d)),
            Exclusion::Glob(glob) => !is_dir && (glob.matches(&text) || glob.matches(&file_name)),
            Exclusion::Substring(s) => text.contains(s.as_str()),
        })
    }
}

pub struct FileWalker {
    root: PathBuf,
    exclusions: Arc<ExclusionSet>,
}

impl FileWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclusions: Arc::new(ExclusionSet::default()),
        }
    }

    pub fn with_exclusions<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        self.exclusions = Arc::new(ExclusionSet::new(patterns));
        self
    }

    /// Collect every non-excluded `.py` file, sorted.
    ///
    /// A root that is itself a file is returned as-is, whatever its name.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| Error::io(&self.root, e))?;
        if metadata.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let root = self.root.clone();
        let exclusions = Arc::clone(&self.exclusions);
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                match entry.path().strip_prefix(&root) {
                    Ok(relative) if relative.as_os_str().is_empty() => true,
                    Ok(relative) => !is_dir || !exclusions.is_excluded(relative, true),
                    Err(_) => true,
                }
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == Some(0) => return Err(err.into()),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file()) && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        debug!(root = %self.root.display(), files = files.len(), "discovered files");
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        !self.exclusions.is_excluded(relative, false)
    }
}

/// Discover Python files under `root` with the given exclusion patterns.
pub fn find_python_files<S: AsRef<str>>(root: &Path, exclusions: &[S]) -> Result<Vec<PathBuf>> {
    FileWalker::new(root).with_exclusions(exclusions).walk()
}
