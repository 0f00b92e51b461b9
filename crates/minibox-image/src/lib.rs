//! # minibox-image
//!
//! Populates a container rootfs from an archive.
//!
//! Only plain `.tar` and gzip-compressed tarballs are understood. There is
//! no image format, layering or registry.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod archive;
