//! Container log management.
//!
//! The entry point's stdout and stderr are appended to `container.log` in
//! the container directory. Lifecycle events are appended to the same file
//! with an RFC 3339 timestamp.

use std::io::Write;
use std::path::Path;

use minibox_common::error::{MiniboxError, Result};

/// Reads container logs from disk.
///
/// Returns an empty string if the log file does not exist yet.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_logs(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    std::fs::read_to_string(path).map_err(|e| MiniboxError::io(path, e))
}

/// Appends a timestamped lifecycle line to a container log.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn append_event(path: &Path, event: &str) -> Result<()> {
    let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| MiniboxError::io(path, e))?;
    writeln!(file, "[{stamp}] {event}").map_err(|e| MiniboxError::io(path, e))?;
    Ok(())
}
