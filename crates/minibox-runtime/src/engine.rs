//! Runtime engine that orchestrates container lifecycle.
//!
//! The engine is stateless between calls: every operation re-reads the
//! state index and the limit descriptor from disk. Mutating operations hold
//! the [`StateLock`] across their whole load-mutate-save cycle.
//!
//! Invalid transitions are not errors. They come back as outcome variants
//! (`AlreadyExists`, `NotFound`, `AlreadyRunning`, `NotRunning`) and leave
//! disk state untouched.

use std::path::{Path, PathBuf};

use minibox_common::config::MiniboxConfig;
use minibox_common::error::{MiniboxError, Result};
use minibox_common::types::{ContainerName, ContainerStatus};
use minibox_core::filesystem::{usage, volume};
use minibox_core::limiter::{ResourceLimiter, RlimitLimiter};

use crate::layout::{self, ContainerLayout};
use crate::process::{self, SignalOutcome};
use crate::state::{self, StateEntry, StateLock};

/// Result of [`Engine::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The container was created in the stopped state.
    Created {
        /// Path of the new rootfs.
        rootfs: PathBuf,
    },
    /// A container directory with this name already exists.
    AlreadyExists,
}

/// Result of [`Engine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The entry point was launched.
    Started {
        /// Process-group id of the entry point.
        pid: u32,
    },
    /// The container's process group is still alive.
    AlreadyRunning {
        /// Process-group id already recorded.
        pid: u32,
    },
    /// No container with this name is tracked.
    NotFound,
}

/// Result of [`Engine::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// `SIGTERM` was delivered to the process group.
    Stopped {
        /// Process group that was signaled.
        pid: u32,
    },
    /// The recorded process group no longer existed.
    StoppedAlreadyDead {
        /// Process group that was recorded.
        pid: u32,
    },
    /// The container is not running.
    NotRunning,
    /// No container with this name is tracked.
    NotFound,
}

/// Result of [`Engine::mount_volume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// The link was created.
    Linked {
        /// Host-side path of the link inside the rootfs.
        target: PathBuf,
    },
    /// No container with this name exists.
    NotFound,
}

/// Disk usage of a container rootfs against its quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    /// Bytes used by regular files and links under the rootfs.
    pub used_bytes: u64,
    /// Quota from the limit descriptor, in bytes.
    pub limit_bytes: u64,
}

impl DiskUsage {
    /// Whether usage exceeds the quota. Advisory only.
    #[must_use]
    pub const fn over_quota(&self) -> bool {
        self.used_bytes > self.limit_bytes
    }
}

/// Result of [`Engine::disk_usage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskOutcome {
    /// Usage was computed.
    Usage(DiskUsage),
    /// No container with this name exists.
    NotFound,
}

/// Information about a tracked container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Container name.
    pub name: ContainerName,
    /// Observed status.
    pub status: ContainerStatus,
    /// Process-group id (if running).
    pub pid: Option<u32>,
}

/// The runtime engine that coordinates all container operations.
pub struct Engine {
    config: MiniboxConfig,
    limiter: Box<dyn ResourceLimiter>,
}

impl Engine {
    /// Creates an engine using the rlimit/`cpulimit` limiter.
    #[must_use]
    pub fn new(config: MiniboxConfig) -> Self {
        Self::with_limiter(config, Box::new(RlimitLimiter::detect()))
    }

    /// Creates an engine with a custom resource limiter.
    #[must_use]
    pub fn with_limiter(config: MiniboxConfig, limiter: Box<dyn ResourceLimiter>) -> Self {
        tracing::debug!(
            data_dir = %config.data_dir.display(),
            limiter = limiter.name(),
            "engine configured"
        );
        Self { config, limiter }
    }

    /// Returns the on-disk layout of a container.
    #[must_use]
    pub fn layout(&self, name: &ContainerName) -> ContainerLayout {
        ContainerLayout::new(&self.config.containers_dir, name)
    }

    /// Creates a stopped container, optionally seeding its rootfs from an archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the state index cannot be read or written, or if
    /// the layout cannot be created. No container directory is left behind
    /// on error.
    pub fn create(&self, name: &ContainerName, archive: Option<&Path>) -> Result<CreateOutcome> {
        let _lock = StateLock::acquire(&self.config.state_file)?;
        let mut state = state::load_state(&self.config.state_file)?;

        let created = layout::create_layout(
            &self.config.containers_dir,
            name,
            archive,
            &self.config.default_limits,
        );
        let rootfs = match created {
            Ok(rootfs) => rootfs,
            Err(MiniboxError::AlreadyExists { .. }) => {
                tracing::info!(name = %name, "container already exists");
                return Ok(CreateOutcome::AlreadyExists);
            }
            Err(e) => return Err(e),
        };

        state.set(name.clone(), StateEntry::stopped());
        if let Err(e) = state::save_state(&self.config.state_file, &state) {
            layout::discard(self.layout(name).dir());
            return Err(e);
        }

        tracing::info!(name = %name, "container created");
        Ok(CreateOutcome::Created { rootfs })
    }

    /// Launches the container's entry point under its current limits.
    ///
    /// A container recorded as running whose process group has vanished is
    /// treated as stopped and launched again.
    ///
    /// # Errors
    ///
    /// Returns [`MiniboxError::SpawnFailed`] if the process cannot be started
    /// (the state index is left unchanged), or an error if the descriptor or
    /// state index cannot be read or written.
    pub fn run(&self, name: &ContainerName) -> Result<RunOutcome> {
        let _lock = StateLock::acquire(&self.config.state_file)?;
        let mut state = state::load_state(&self.config.state_file)?;
        let Some(entry) = state.get(name) else {
            return Ok(RunOutcome::NotFound);
        };
        if let Some(pid) = entry.running_pid() {
            if process::probe_group(pid) {
                return Ok(RunOutcome::AlreadyRunning { pid });
            }
            tracing::warn!(name = %name, pid, "recorded process group is gone, relaunching");
        }

        let layout = self.layout(name);
        let limits = crate::limits::read_limits(&layout.limits_file())?;
        let entrypoint = std::path::absolute(layout.entrypoint())
            .map_err(|e| MiniboxError::io(layout.entrypoint(), e))?;
        let command = self.limiter.command(&entrypoint, &limits);
        let pid = process::spawn_group(command, layout.dir(), &layout.log_file())?;

        state.set(name.clone(), StateEntry::running(pid));
        state::save_state(&self.config.state_file, &state)?;

        record_event(
            &layout,
            &format!(
                "started process group {pid} (limiter {}, cpu {}%, memory {} MiB)",
                self.limiter.name(),
                limits.cpu,
                limits.memory
            ),
        );
        tracing::info!(name = %name, pid, "container started");
        Ok(RunOutcome::Started { pid })
    }

    /// Sends `SIGTERM` to the container's process group and marks it stopped.
    ///
    /// Does not wait for the processes to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be delivered for a reason other
    /// than the group being gone, or if the state index cannot be written.
    pub fn stop(&self, name: &ContainerName) -> Result<StopOutcome> {
        let _lock = StateLock::acquire(&self.config.state_file)?;
        let mut state = state::load_state(&self.config.state_file)?;
        let Some(entry) = state.get(name) else {
            return Ok(StopOutcome::NotFound);
        };
        let Some(pid) = entry.running_pid() else {
            return Ok(StopOutcome::NotRunning);
        };

        let outcome = match process::signal_group(pid)? {
            SignalOutcome::Delivered => StopOutcome::Stopped { pid },
            SignalOutcome::NoSuchGroup => StopOutcome::StoppedAlreadyDead { pid },
        };

        state.set(name.clone(), StateEntry::stopped());
        state::save_state(&self.config.state_file, &state)?;

        record_event(&self.layout(name), &format!("sent SIGTERM to process group {pid}"));
        tracing::info!(name = %name, pid, ?outcome, "container stopped");
        Ok(outcome)
    }

    /// Lists all tracked containers, sorted by name.
    ///
    /// Running entries whose process group has vanished are reported as
    /// stopped. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the state index cannot be read.
    pub fn list(&self) -> Result<Vec<ContainerInfo>> {
        let state = state::load_state(&self.config.state_file)?;
        Ok(state
            .containers
            .iter()
            .map(|(name, entry)| {
                let pid = entry.running_pid().filter(|&pid| {
                    let alive = process::probe_group(pid);
                    if !alive {
                        tracing::debug!(name = %name, pid, "process group gone, reporting stopped");
                    }
                    alive
                });
                ContainerInfo {
                    name: name.clone(),
                    status: if pid.is_some() {
                        ContainerStatus::Running
                    } else {
                        ContainerStatus::Stopped
                    },
                    pid,
                }
            })
            .collect())
    }

    /// Links `host_path` into the container at `container_path`.
    ///
    /// Anything already at the target is replaced. The container path is not
    /// confined to the rootfs.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the link cannot be created.
    pub fn mount_volume(
        &self,
        name: &ContainerName,
        host_path: &Path,
        container_path: &Path,
    ) -> Result<MountOutcome> {
        let layout = self.layout(name);
        if !layout.exists() {
            return Ok(MountOutcome::NotFound);
        }
        let target = volume::target_in_rootfs(&layout.rootfs(), container_path);
        volume::link_volume(host_path, &target)?;
        tracing::info!(name = %name, target = %target.display(), "volume mounted");
        Ok(MountOutcome::Linked { target })
    }

    /// Measures the container rootfs against its disk quota.
    ///
    /// # Errors
    ///
    /// Returns an error if the rootfs cannot be walked or the descriptor
    /// cannot be read.
    pub fn disk_usage(&self, name: &ContainerName) -> Result<DiskOutcome> {
        let layout = self.layout(name);
        if !layout.exists() {
            return Ok(DiskOutcome::NotFound);
        }
        let used_bytes = usage::directory_usage(&layout.rootfs())?;
        let limits = crate::limits::read_limits(&layout.limits_file())?;
        let report = DiskUsage {
            used_bytes,
            limit_bytes: limits.disk_limit_bytes(),
        };
        if report.over_quota() {
            tracing::warn!(name = %name, used = used_bytes, limit = report.limit_bytes, "disk quota exceeded");
        }
        Ok(DiskOutcome::Usage(report))
    }

    /// Returns the container log, or `None` if the container does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read.
    pub fn logs(&self, name: &ContainerName) -> Result<Option<String>> {
        let layout = self.layout(name);
        if !layout.exists() {
            return Ok(None);
        }
        crate::logs::read_logs(&layout.log_file()).map(Some)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(MiniboxConfig::default())
    }
}

/// Appends a lifecycle line to the container log; failures are only logged.
fn record_event(layout: &ContainerLayout, event: &str) {
    if let Err(e) = crate::logs::append_event(&layout.log_file(), event) {
        tracing::warn!(error = %e, "failed to record lifecycle event");
    }
}
