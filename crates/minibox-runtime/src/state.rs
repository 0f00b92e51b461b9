//! Persistent state management.
//!
//! Maintains a local JSON index mapping every container name to its status
//! and process-group id, enabling daemon-less lifecycle management. The
//! index is always loaded, mutated and saved as a whole; callers serialize
//! that cycle with a [`StateLock`].

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use minibox_common::constants::STATE_LOCK_SUFFIX;
use minibox_common::error::{MiniboxError, Result};
use minibox_common::types::{ContainerName, ContainerStatus};
use nix::fcntl::{Flock, FlockArg};
use serde::{Deserialize, Serialize};

/// Persistent record of a container's state.
///
/// `pid` is set exactly when `status` is [`ContainerStatus::Running`]; use
/// [`StateEntry::stopped`] and [`StateEntry::running`] to build entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Current lifecycle state.
    pub status: ContainerStatus,
    /// Process-group id of the entry point (if running).
    pub pid: Option<u32>,
}

impl StateEntry {
    /// An entry with no process attached.
    #[must_use]
    pub const fn stopped() -> Self {
        Self {
            status: ContainerStatus::Stopped,
            pid: None,
        }
    }

    /// An entry tracking the given process group.
    #[must_use]
    pub const fn running(pid: u32) -> Self {
        Self {
            status: ContainerStatus::Running,
            pid: Some(pid),
        }
    }

    /// Returns the recorded process group if the entry claims to be running.
    #[must_use]
    pub const fn running_pid(&self) -> Option<u32> {
        match (self.status, self.pid) {
            (ContainerStatus::Running, Some(pid)) => Some(pid),
            _ => None,
        }
    }
}

/// The whole state index, keyed and ordered by container name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateFile {
    /// Tracked containers.
    pub containers: BTreeMap<ContainerName, StateEntry>,
}

impl StateFile {
    /// Returns the entry for `name`, if tracked.
    #[must_use]
    pub fn get(&self, name: &ContainerName) -> Option<&StateEntry> {
        self.containers.get(name)
    }

    /// Inserts or replaces the entry for `name`.
    pub fn set(&mut self, name: ContainerName, entry: StateEntry) {
        let _ = self.containers.insert(name, entry);
    }

    /// Number of tracked containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether no container is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// Loads the state index from disk.
///
/// A missing file yields an empty index.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_state(path: &Path) -> Result<StateFile> {
    tracing::debug!(path = %path.display(), "loading state index");
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StateFile::default()),
        Err(e) => return Err(MiniboxError::io(path, e)),
    };
    Ok(serde_json::from_str(&content)?)
}

/// Persists the state index to disk, replacing the previous file.
///
/// The JSON is written to a temporary sibling and renamed over `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_state(path: &Path, state: &StateFile) -> Result<()> {
    tracing::debug!(path = %path.display(), entries = state.len(), "saving state index");
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir).map_err(|e| MiniboxError::io(dir, e))?;

    let mut json = serde_json::to_string_pretty(state)?;
    json.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| MiniboxError::io(dir, e))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| MiniboxError::io(tmp.path(), e))?;
    let _ = tmp
        .persist(path)
        .map_err(|e| MiniboxError::io(path, e.error))?;
    Ok(())
}

/// Exclusive advisory lock guarding one load-mutate-save cycle.
///
/// Backed by `flock(2)` on `<state file>.lock`; released on drop.
#[derive(Debug)]
pub struct StateLock {
    _lock: Flock<File>,
}

impl StateLock {
    /// Blocks until the lock next to `state_file` is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked.
    pub fn acquire(state_file: &Path) -> Result<Self> {
        let path = lock_path(state_file);
        let dir = parent_dir(&path);
        std::fs::create_dir_all(dir).map_err(|e| MiniboxError::io(dir, e))?;

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| MiniboxError::io(&path, e))?;
        let lock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| {
            MiniboxError::Lock {
                path: path.clone(),
                errno: errno.to_string(),
            }
        })?;
        tracing::trace!(path = %path.display(), "state lock acquired");
        Ok(Self { _lock: lock })
    }
}

/// Returns `<state file>.lock`.
#[must_use]
pub fn lock_path(state_file: &Path) -> PathBuf {
    let mut os: OsString = state_file.as_os_str().to_owned();
    os.push(STATE_LOCK_SUFFIX);
    PathBuf::from(os)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
