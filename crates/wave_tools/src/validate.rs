//! Config loading and validation.
//!
//! The core parses RON text it is handed; this module owns the file IO.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use wave_core::config::SimConfig;
use wave_core::error::GameError;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Failed to read a file or directory.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The simulation rejected the config or an operation on it.
    #[error(transparent)]
    Config(#[from] GameError),

    /// A config parsed but has problems.
    #[error("Validation failed for '{}': {issues:?}", path.display())]
    Validation {
        /// File that failed.
        path: PathBuf,
        /// Every problem found.
        issues: Vec<String>,
    },

    /// Failed to encode output.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Validation outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// Problems found; empty when the file is clean.
    pub issues: Vec<String>,
}

impl FileReport {
    /// Whether the file had no issues.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Read and parse a RON config file.
///
/// # Errors
///
/// Returns [`ToolError::Io`] if the file cannot be read and
/// [`ToolError::Config`] if it is not a valid config document.
pub fn load_config(path: &Path) -> ToolResult<SimConfig> {
    let text = fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = SimConfig::parse(&text, &path.display().to_string())?;
    debug!(path = %path.display(), tiers = config.tiers.len(), "loaded config");
    Ok(config)
}

/// Load a config and fail if it has any validation issue.
///
/// # Errors
///
/// Returns [`ToolError::Validation`] listing every issue, or the errors of
/// [`load_config`].
pub fn load_validated(path: &Path) -> ToolResult<SimConfig> {
    let config = load_config(path)?;
    let issues = config.validate();
    if issues.is_empty() {
        Ok(config)
    } else {
        Err(ToolError::Validation {
            path: path.to_path_buf(),
            issues,
        })
    }
}

/// Validate one config file.
///
/// Parse failures are reported as a single issue so a directory run can
/// keep going.
///
/// # Errors
///
/// Returns [`ToolError::Io`] if the file cannot be read.
pub fn validate_config_file(path: &Path) -> ToolResult<FileReport> {
    let issues = match load_config(path) {
        Ok(config) => config.validate(),
        Err(ToolError::Config(err)) => vec![err.to_string()],
        Err(err) => return Err(err),
    };
    for issue in &issues {
        warn!(path = %path.display(), "{issue}");
    }
    Ok(FileReport {
        path: path.to_path_buf(),
        issues,
    })
}

/// Validate a config file, or every `.ron` file in a directory (sorted by
/// name, not recursive).
///
/// # Errors
///
/// Returns [`ToolError::Io`] if the path or a file in it cannot be read.
pub fn validate_path(path: &Path) -> ToolResult<Vec<FileReport>> {
    if !path.is_dir() {
        return Ok(vec![validate_config_file(path)?]);
    }

    let io_error = |source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_error)? {
        let file = entry.map_err(io_error)?.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "ron") {
            files.push(file);
        }
    }
    files.sort();

    files.iter().map(|file| validate_config_file(file)).collect()
}
