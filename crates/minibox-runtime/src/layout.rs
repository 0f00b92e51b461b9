//! On-disk container layout.
//!
//! Every container owns one directory under the containers root:
//!
//! ```text
//! <name>/
//!   rootfs/          sandbox filesystem root
//!   limits.json      resource limit descriptor
//!   run.sh           generated entry point (0755)
//!   container.log    entry-point output, created on first run
//! ```
//!
//! Creation is staged in a sibling `.staging-*` directory and committed with
//! a single rename, so a container directory either exists complete or not
//! at all.

use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use minibox_common::constants::{
    ENTRYPOINT_FILE_NAME, ENTRYPOINT_IDLE_SECS, ENTRYPOINT_MODE, LIMITS_FILE_NAME,
    LOG_FILE_NAME, ROOTFS_DIR_NAME, STAGING_PREFIX,
};
use minibox_common::error::{MiniboxError, Result};
use minibox_common::types::{ContainerName, ResourceLimits};

/// Paths belonging to one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLayout {
    dir: PathBuf,
}

impl ContainerLayout {
    /// Layout of `name` under `containers_dir`.
    #[must_use]
    pub fn new(containers_dir: &Path, name: &ContainerName) -> Self {
        Self {
            dir: containers_dir.join(name.as_str()),
        }
    }

    fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// The container directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The sandbox filesystem root.
    #[must_use]
    pub fn rootfs(&self) -> PathBuf {
        self.dir.join(ROOTFS_DIR_NAME)
    }

    /// The resource limit descriptor.
    #[must_use]
    pub fn limits_file(&self) -> PathBuf {
        self.dir.join(LIMITS_FILE_NAME)
    }

    /// The generated entry-point script.
    #[must_use]
    pub fn entrypoint(&self) -> PathBuf {
        self.dir.join(ENTRYPOINT_FILE_NAME)
    }

    /// The entry-point output log.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    /// Whether anything exists at the container directory.
    #[must_use]
    pub fn exists(&self) -> bool {
        std::fs::symlink_metadata(&self.dir).is_ok()
    }
}

/// Renders the placeholder entry point for `name`.
#[must_use]
pub fn entrypoint_script(name: &ContainerName) -> String {
    format!(
        "#!/bin/sh\n\
         echo \"Hello from container {name}\"\n\
         sleep {ENTRYPOINT_IDLE_SECS}\n"
    )
}

/// Creates the directory tree for `name` and returns its rootfs path.
///
/// If `archive` is a regular file it is unpacked into the rootfs. Unpack
/// failures are logged and otherwise ignored.
///
/// # Errors
///
/// Returns [`MiniboxError::AlreadyExists`] if the container directory is
/// already present, or an I/O error if any part of the layout cannot be
/// written. On error nothing is left behind.
pub fn create_layout(
    containers_dir: &Path,
    name: &ContainerName,
    archive: Option<&Path>,
    limits: &ResourceLimits,
) -> Result<PathBuf> {
    stage_and_commit(containers_dir, name, |staging| {
        populate(staging, name, archive, limits)
    })
}

/// Runs `fill` against a fresh staging directory and renames it into place.
fn stage_and_commit<F>(containers_dir: &Path, name: &ContainerName, fill: F) -> Result<PathBuf>
where
    F: FnOnce(&ContainerLayout) -> Result<()>,
{
    let layout = ContainerLayout::new(containers_dir, name);
    if layout.exists() {
        return Err(already_exists(name));
    }
    std::fs::create_dir_all(containers_dir).map_err(|e| MiniboxError::io(containers_dir, e))?;

    let staging = ContainerLayout::at(containers_dir.join(staging_name(name)));
    if let Err(e) = fill(&staging) {
        discard(staging.dir());
        return Err(e);
    }

    if let Err(e) = std::fs::rename(staging.dir(), layout.dir()) {
        discard(staging.dir());
        if layout.exists() {
            return Err(already_exists(name));
        }
        return Err(MiniboxError::io(layout.dir(), e));
    }

    tracing::info!(name = %name, dir = %layout.dir().display(), "container layout created");
    Ok(layout.rootfs())
}

fn populate(
    staging: &ContainerLayout,
    name: &ContainerName,
    archive: Option<&Path>,
    limits: &ResourceLimits,
) -> Result<()> {
    let rootfs = staging.rootfs();
    std::fs::create_dir_all(&rootfs).map_err(|e| MiniboxError::io(&rootfs, e))?;

    if let Some(archive) = archive {
        unpack_best_effort(archive, &rootfs);
    }

    crate::limits::write_limits(&staging.limits_file(), limits)?;

    let entrypoint = staging.entrypoint();
    std::fs::write(&entrypoint, entrypoint_script(name))
        .map_err(|e| MiniboxError::io(&entrypoint, e))?;
    std::fs::set_permissions(&entrypoint, Permissions::from_mode(ENTRYPOINT_MODE))
        .map_err(|e| MiniboxError::io(&entrypoint, e))?;
    Ok(())
}

fn unpack_best_effort(archive: &Path, rootfs: &Path) {
    if !archive.is_file() {
        tracing::warn!(archive = %archive.display(), "archive is not a regular file, skipping");
        return;
    }
    if let Err(e) = minibox_image::archive::extract_archive(archive, rootfs) {
        tracing::warn!(archive = %archive.display(), error = %e, "archive extraction failed");
    }
}

fn staging_name(name: &ContainerName) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    format!("{STAGING_PREFIX}{name}-{}-{nanos}", std::process::id())
}

/// Removes a container or staging directory, logging any failure.
pub(crate) fn discard(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "failed to remove staging directory");
    }
}

fn already_exists(name: &ContainerName) -> MiniboxError {
    MiniboxError::AlreadyExists {
        kind: "container",
        id: name.to_string(),
    }
}
