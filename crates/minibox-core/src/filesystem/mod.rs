//! Filesystem helpers operating on a container's rootfs.
//!
//! Provides host-path volume links and recursive disk accounting.

pub mod usage;
pub mod volume;
