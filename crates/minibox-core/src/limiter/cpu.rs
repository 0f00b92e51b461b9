//! CPU throttling through the `cpulimit` utility.
//!
//! `cpulimit` samples its child and sends `SIGSTOP`/`SIGCONT` to keep it
//! under a percentage of one core. It stays in the child's process group,
//! so signaling the group reaches it too.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Locates `cpulimit` on `PATH`.
#[must_use]
pub fn find_cpulimit() -> Option<PathBuf> {
    which::which("cpulimit").ok()
}

/// Builds `cpulimit -l <percent> -- <entrypoint>`.
#[must_use]
pub fn wrap_with_cpulimit(binary: &Path, entrypoint: &Path, percent: u32) -> Command {
    let mut cmd = Command::new(binary);
    let _ = cmd
        .arg("-l")
        .arg(percent.max(1).to_string())
        .arg("--")
        .arg(entrypoint);
    tracing::debug!(percent, "CPU ceiling applied via cpulimit");
    cmd
}
