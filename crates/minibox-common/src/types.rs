//! Domain primitive types used across the Minibox workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BYTES_PER_MB, DEFAULT_CPU_PERCENT, DEFAULT_DISK_MB, DEFAULT_MEMORY_MB, MAX_NAME_LEN,
};
use crate::error::{MiniboxError, Result};

/// Filesystem-safe container name.
///
/// Names double as directory names and state keys, so they are restricted
/// to ASCII alphanumerics, `-`, `_` and `.`, and may not start with `.`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerName(String);

impl ContainerName {
    /// Validates and wraps a container name.
    ///
    /// # Errors
    ///
    /// Returns [`MiniboxError::InvalidName`] if the name is empty, too long,
    /// starts with `.`, or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.len() > MAX_NAME_LEN {
            Some("name is longer than 64 bytes")
        } else if name.starts_with('.') {
            Some("name starts with '.'")
        } else if !name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        {
            Some("name may only contain ASCII letters, digits, '-', '_' and '.'")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(MiniboxError::InvalidName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContainerName {
    type Err = MiniboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContainerName {
    type Error = MiniboxError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ContainerName> for String {
    fn from(name: ContainerName) -> Self {
        name.0
    }
}

/// Per-container resource ceilings, as stored in `limits.json`.
///
/// Fields missing from the descriptor fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU ceiling in percent of one core.
    #[serde(default = "default_cpu")]
    pub cpu: u32,
    /// Memory ceiling in MiB.
    #[serde(default = "default_memory")]
    pub memory: u64,
    /// Disk quota in MiB.
    #[serde(default = "default_disk")]
    pub disk: u64,
}

const fn default_cpu() -> u32 {
    DEFAULT_CPU_PERCENT
}

const fn default_memory() -> u64 {
    DEFAULT_MEMORY_MB
}

const fn default_disk() -> u64 {
    DEFAULT_DISK_MB
}

impl ResourceLimits {
    /// Memory ceiling in bytes.
    #[must_use]
    pub const fn memory_limit_bytes(&self) -> u64 {
        self.memory.saturating_mul(BYTES_PER_MB)
    }

    /// Disk quota in bytes.
    #[must_use]
    pub const fn disk_limit_bytes(&self) -> u64 {
        self.disk.saturating_mul(BYTES_PER_MB)
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_PERCENT,
            memory: DEFAULT_MEMORY_MB,
            disk: DEFAULT_DISK_MB,
        }
    }
}

/// Lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// No process group is associated with the container.
    Stopped,
    /// The entry point was launched and its process group is tracked.
    Running,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
        }
    }
}
