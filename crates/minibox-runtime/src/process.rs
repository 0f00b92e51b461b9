//! Process-group supervision for container entry points.
//!
//! Each entry point runs as the leader of a fresh process group, so one
//! signal reaches it and everything it started. The controller never waits
//! for or reaps these processes; they outlive the invocation that spawned
//! them.

use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use minibox_common::error::{MiniboxError, Result};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

/// Result of signaling a recorded process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The signal was delivered to at least one member of the group.
    Delivered,
    /// No process belongs to the group any more.
    NoSuchGroup,
}

/// Spawns `cmd` as a new process-group leader and returns its pid.
///
/// The child runs in `cwd` with stdin closed and stdout/stderr appended to
/// `log_path`. Its pid doubles as the process-group id.
///
/// # Errors
///
/// Returns [`MiniboxError::SpawnFailed`] if the process cannot be started,
/// or an I/O error if the log file cannot be opened.
#[allow(clippy::zombie_processes)]
pub fn spawn_group(mut cmd: Command, cwd: &Path, log_path: &Path) -> Result<u32> {
    let stdout = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| MiniboxError::io(log_path, e))?;
    let stderr = stdout
        .try_clone()
        .map_err(|e| MiniboxError::io(log_path, e))?;

    let _ = cmd
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .process_group(0);

    let program = cmd.get_program().to_string_lossy().into_owned();
    let child = cmd
        .spawn()
        .map_err(|source| MiniboxError::SpawnFailed { program, source })?;
    let pid = child.id();
    tracing::info!(pid, cwd = %cwd.display(), "spawned process group");
    Ok(pid)
}

/// Returns whether any process still belongs to group `pgid`.
///
/// A group we are not allowed to signal (`EPERM`) still exists.
#[must_use]
pub fn probe_group(pgid: u32) -> bool {
    let Some(group) = group_target(pgid) else {
        return false;
    };
    match kill(group, None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(Errno::ESRCH) => false,
        Err(errno) => {
            tracing::warn!(pgid, %errno, "unexpected error probing process group");
            true
        }
    }
}

/// Sends `SIGTERM` to every process in group `pgid`.
///
/// # Errors
///
/// Returns [`MiniboxError::Signal`] if delivery fails for any reason other
/// than the group no longer existing.
pub fn signal_group(pgid: u32) -> Result<SignalOutcome> {
    let Some(group) = group_target(pgid) else {
        tracing::warn!(pgid, "recorded process group id is not signalable");
        return Ok(SignalOutcome::NoSuchGroup);
    };
    match kill(group, Signal::SIGTERM) {
        Ok(()) => {
            tracing::info!(pgid, "sent SIGTERM to process group");
            Ok(SignalOutcome::Delivered)
        }
        Err(Errno::ESRCH) => {
            tracing::info!(pgid, "process group already gone");
            Ok(SignalOutcome::NoSuchGroup)
        }
        Err(errno) => Err(MiniboxError::Signal {
            pgid,
            errno: errno.to_string(),
        }),
    }
}

/// Converts a group id into the negative pid `kill(2)` expects.
///
/// Ids 0 and 1 would address our own group or init and are refused.
fn group_target(pgid: u32) -> Option<Pid> {
    let raw = i32::try_from(pgid).ok().filter(|&p| p > 1)?;
    Some(Pid::from_raw(-raw))
}
