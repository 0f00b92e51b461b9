//! Global configuration model for the Minibox runtime.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{CONTAINERS_DIR_NAME, DEFAULT_DATA_DIR, STATE_FILE_NAME};
use crate::types::ResourceLimits;

/// Root configuration for the Minibox runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniboxConfig {
    /// Base directory for Minibox state and data.
    pub data_dir: PathBuf,
    /// Path to the state index file.
    pub state_file: PathBuf,
    /// Directory holding one subdirectory per container.
    pub containers_dir: PathBuf,
    /// Limits written into every new container's descriptor.
    pub default_limits: ResourceLimits,
}

impl MiniboxConfig {
    /// Derives every path from a single data directory.
    #[must_use]
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            state_file: data_dir.join(STATE_FILE_NAME),
            containers_dir: data_dir.join(CONTAINERS_DIR_NAME),
            data_dir,
            default_limits: ResourceLimits::default(),
        }
    }
}

impl Default for MiniboxConfig {
    fn default() -> Self {
        Self::from_data_dir(DEFAULT_DATA_DIR)
    }
}
