//! Memory ceiling via `RLIMIT_AS`.
//!
//! The limit is set in the forked child right before `exec`, and every
//! process the entry point starts inherits it.

use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::sys::resource::{Resource, setrlimit};

/// Caps the virtual address space of the spawned process at `bytes`.
pub fn limit_address_space(cmd: &mut Command, bytes: u64) {
    let limit = libc::rlim_t::from(bytes);
    // SAFETY: the closure runs between fork and exec and only issues the
    // async-signal-safe setrlimit(2) syscall.
    unsafe {
        let _ = cmd.pre_exec(move || {
            setrlimit(Resource::RLIMIT_AS, limit, limit).map_err(std::io::Error::from)
        });
    }
    tracing::debug!(bytes, "memory ceiling applied via RLIMIT_AS");
}
