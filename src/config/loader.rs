use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::AnalysisConfig;
use crate::errors::{Error, Result};

/// File name searched for by [`discover_config`].
pub const CONFIG_FILE_NAME: &str = ".connascence.toml";

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Load and validate configuration from an explicit TOML file.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let contents = read_config_file(path).map_err(|e| Error::io(path, e))?;
    let config = AnalysisConfig::from_toml_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Pure function to try loading config from a specific path
fn try_load_config_from_path(config_path: &Path) -> Option<Result<AnalysisConfig>> {
    match read_config_file(config_path) {
        Ok(contents) => Some(AnalysisConfig::from_toml_str(&contents).inspect(|_| {
            tracing::debug!("Loaded config from {}", config_path.display());
        })),
        Err(e) => {
            handle_read_error(config_path, &e);
            None
        }
    }
}

/// Handle file read errors with appropriate logging
fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        tracing::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find the nearest `.connascence.toml` at or above `start`.
///
/// Falls back to defaults when no file exists. A file that exists but is
/// malformed or invalid is an error, never silently ignored.
pub fn discover_config(start: &Path) -> Result<AnalysisConfig> {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            Ok(AnalysisConfig::default())
        })
}
