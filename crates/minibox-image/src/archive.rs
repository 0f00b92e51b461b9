//! Tar archive extraction into a rootfs directory.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use minibox_common::error::{MiniboxError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Summary of an unpacked archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedArchive {
    /// Size of the archive file in bytes.
    pub size_bytes: u64,
    /// Whether the archive was gzip-compressed.
    pub compressed: bool,
}

/// Extracts a tar archive to the target directory.
///
/// Supports both plain `.tar` and gzip-compressed `.tar.gz` / `.tgz`
/// archives. Compression is detected from the extension or, failing that,
/// from the gzip magic bytes.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or unpacked.
pub fn extract_archive(archive_path: &Path, target: &Path) -> Result<ExtractedArchive> {
    tracing::info!(
        archive = %archive_path.display(),
        target = %target.display(),
        "extracting archive"
    );

    std::fs::create_dir_all(target).map_err(|e| MiniboxError::io(target, e))?;

    let mut file = File::open(archive_path).map_err(|e| MiniboxError::io(archive_path, e))?;
    let size_bytes = file
        .metadata()
        .map_err(|e| MiniboxError::io(archive_path, e))?
        .len();

    let compressed = is_gzip_archive(archive_path) || has_gzip_magic(&mut file, archive_path)?;
    let reader = BufReader::new(file);

    let unpacked = if compressed {
        tar::Archive::new(flate2::read::GzDecoder::new(reader)).unpack(target)
    } else {
        tar::Archive::new(reader).unpack(target)
    };
    unpacked.map_err(|e| MiniboxError::io(target, e))?;

    tracing::info!(size = size_bytes, compressed, "archive extracted");
    Ok(ExtractedArchive {
        size_bytes,
        compressed,
    })
}

/// Determines whether the archive is gzip-compressed based on extension.
fn is_gzip_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("tgz"))
}

/// Peeks at the first two bytes and rewinds.
fn has_gzip_magic(file: &mut File, path: &Path) -> Result<bool> {
    let mut magic = [0u8; 2];
    let matched = match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(MiniboxError::io(path, e)),
    };
    let _ = file
        .seek(SeekFrom::Start(0))
        .map_err(|e| MiniboxError::io(path, e))?;
    Ok(matched)
}
