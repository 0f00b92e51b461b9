//! Disk accounting for a container rootfs.
//!
//! Sizes are apparent sizes (`st_size`), not allocated blocks. Symbolic
//! links are never followed: a linked volume contributes the size of the
//! link itself, not of its target.

use std::path::Path;

use minibox_common::error::{MiniboxError, Result};
use walkdir::WalkDir;

/// Returns the total size in bytes of regular files and symlinks under `root`.
///
/// # Errors
///
/// Returns an error if `root` or any entry beneath it cannot be read.
pub fn directory_usage(root: &Path) -> Result<u64> {
    let mut total: u64 = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            MiniboxError::io(path, e.into())
        })?;
        let file_type = entry.file_type();
        if file_type.is_file() || file_type.is_symlink() {
            let meta = entry
                .metadata()
                .map_err(|e| MiniboxError::io(entry.path(), e.into()))?;
            total = total.saturating_add(meta.len());
        }
    }
    tracing::debug!(root = %root.display(), bytes = total, "disk usage computed");
    Ok(total)
}
