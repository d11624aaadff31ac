//! Append-only log file kept beside the config.
//!
//! The listener usually runs unattended; the file keeps a record of every
//! alert and dropped datagram across restarts.  Lines are appended, never
//! truncated.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The log file could not be opened for appending.
#[derive(Debug, Error)]
#[error("failed to open log file {path}: {source}")]
pub struct LogFileError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Opens `path` for appending, creating it and its parent directory if needed.
///
/// # Errors
///
/// Returns [`LogFileError`] if the directory or file cannot be created.
pub fn open_log_file(path: &Path) -> Result<File, LogFileError> {
    let wrap = |source| LogFileError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(wrap)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(wrap)
}
