//! Best-effort resource limiting for container entry points.
//!
//! A [`ResourceLimiter`] turns an entry point and a set of limits into a
//! [`Command`] ready to spawn. The lifecycle controller only ever talks to
//! this trait, so a cgroup-backed implementation can replace the default
//! without touching it.

pub mod cpu;
pub mod memory;

use std::path::{Path, PathBuf};
use std::process::Command;

use minibox_common::types::ResourceLimits;

/// Wraps a container entry point with resource constraints.
pub trait ResourceLimiter: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Builds the command that launches `entrypoint` under `limits`.
    ///
    /// The caller configures process group, working directory and stdio.
    fn command(&self, entrypoint: &Path, limits: &ResourceLimits) -> Command;
}

/// Caps memory with `RLIMIT_AS` and CPU with `cpulimit` when available.
#[derive(Debug, Clone, Default)]
pub struct RlimitLimiter {
    cpulimit: Option<PathBuf>,
}

impl RlimitLimiter {
    /// Creates a limiter, looking up `cpulimit` on `PATH`.
    #[must_use]
    pub fn detect() -> Self {
        let cpulimit = cpu::find_cpulimit();
        if cpulimit.is_none() {
            tracing::debug!("cpulimit not found on PATH, CPU ceilings will not be applied");
        }
        Self { cpulimit }
    }

    /// Creates a limiter that only applies the memory ceiling.
    #[must_use]
    pub const fn memory_only() -> Self {
        Self { cpulimit: None }
    }

    /// Creates a limiter that throttles CPU through the given `cpulimit` binary.
    #[must_use]
    pub fn with_cpulimit(binary: impl Into<PathBuf>) -> Self {
        Self {
            cpulimit: Some(binary.into()),
        }
    }
}

impl ResourceLimiter for RlimitLimiter {
    fn name(&self) -> &'static str {
        "rlimit"
    }

    fn command(&self, entrypoint: &Path, limits: &ResourceLimits) -> Command {
        let mut cmd = match &self.cpulimit {
            Some(binary) => cpu::wrap_with_cpulimit(binary, entrypoint, limits.cpu),
            None => {
                tracing::warn!(cpu = limits.cpu, "CPU ceiling not applied");
                Command::new(entrypoint)
            }
        };
        memory::limit_address_space(&mut cmd, limits.memory_limit_bytes());
        cmd
    }
}

/// Launches the entry point without any constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedLimiter;

impl ResourceLimiter for UnlimitedLimiter {
    fn name(&self) -> &'static str {
        "unlimited"
    }

    fn command(&self, entrypoint: &Path, _limits: &ResourceLimits) -> Command {
        Command::new(entrypoint)
    }
}
