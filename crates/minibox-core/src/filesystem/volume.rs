//! Host-path volumes linked into a container rootfs.
//!
//! A volume is a symbolic link inside the rootfs pointing at a host path,
//! so the host and the container see the same underlying file. The
//! container path is joined onto the rootfs as given: `..` segments are not
//! resolved and nothing checks that the result stays inside the rootfs.

use std::path::{Component, Path, PathBuf};

use minibox_common::error::{MiniboxError, Result};

/// Maps a container-side path onto the host path under `rootfs`.
///
/// A leading `/` is relative to the rootfs; every other component is kept.
#[must_use]
pub fn target_in_rootfs(rootfs: &Path, container_path: &Path) -> PathBuf {
    let relative: PathBuf = container_path
        .components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect();
    rootfs.join(relative)
}

/// Links `target` to `host_path`, replacing whatever was there.
///
/// Missing parent directories are created. An existing file, link or
/// directory tree at `target` is removed first.
///
/// # Errors
///
/// Returns an error if any filesystem operation fails.
pub fn link_volume(host_path: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MiniboxError::io(parent, e))?;
    }

    remove_existing(target)?;

    std::os::unix::fs::symlink(host_path, target).map_err(|e| MiniboxError::io(target, e))?;
    tracing::info!(
        source = %host_path.display(),
        target = %target.display(),
        "volume linked"
    );
    Ok(())
}

fn remove_existing(target: &Path) -> Result<()> {
    let Ok(meta) = std::fs::symlink_metadata(target) else {
        return Ok(());
    };
    let removed = if meta.is_dir() {
        std::fs::remove_dir_all(target)
    } else {
        std::fs::remove_file(target)
    };
    removed.map_err(|e| MiniboxError::io(target, e))?;
    tracing::debug!(target = %target.display(), "replaced existing entry");
    Ok(())
}
