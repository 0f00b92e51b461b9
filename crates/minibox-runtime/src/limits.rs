//! Resource limit descriptors (`limits.json`).
//!
//! The descriptor is the only record of a container's limits. It is read
//! from disk on every `run` and `disk`, so edits made between invocations
//! take effect immediately.

use std::path::Path;

use minibox_common::error::{MiniboxError, Result};
use minibox_common::types::ResourceLimits;

/// Reads the descriptor at `path`; missing fields take their defaults.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or not valid JSON.
pub fn read_limits(path: &Path) -> Result<ResourceLimits> {
    let content = std::fs::read_to_string(path).map_err(|e| MiniboxError::io(path, e))?;
    let limits: ResourceLimits = serde_json::from_str(&content)?;
    tracing::debug!(
        path = %path.display(),
        cpu = limits.cpu,
        memory = limits.memory,
        disk = limits.disk,
        "limits loaded"
    );
    Ok(limits)
}

/// Writes `limits` to `path`, replacing any existing descriptor.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_limits(path: &Path, limits: &ResourceLimits) -> Result<()> {
    let json = serde_json::to_string(limits)?;
    std::fs::write(path, json).map_err(|e| MiniboxError::io(path, e))
}
