//! Unified error types for the Minibox workspace.
//!
//! Invalid lifecycle transitions (creating an existing container, stopping a
//! stopped one) are not errors; they are reported through the outcome enums
//! of the runtime crate. Everything here is either fatal for the invocation
//! or a failure the CLI reports and recovers from.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum MiniboxError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A container name is not usable as a directory name.
    #[error("invalid container name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A resource already exists.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Type of the conflicting resource.
        kind: &'static str,
        /// Identifier of the conflicting resource.
        id: String,
    },

    /// The entry-point process could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    SpawnFailed {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Signal delivery failed for a reason other than a missing target.
    #[error("failed to signal process group {pgid}: {errno}")]
    Signal {
        /// Target process group.
        pgid: u32,
        /// Errno returned by `kill(2)`.
        errno: String,
    },

    /// The state lock could not be taken.
    #[error("failed to lock {path}: {errno}")]
    Lock {
        /// Lock file path.
        path: PathBuf,
        /// Errno returned by `flock(2)`.
        errno: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl MiniboxError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns whether the CLI should report this error and exit cleanly.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidName { .. } | Self::SpawnFailed { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MiniboxError>;
