//! # minibox-core
//!
//! Host-level primitives for the Minibox runtime.
//!
//! This crate provides:
//! - **Limiters**: the [`limiter::ResourceLimiter`] seam that turns an entry
//!   point and a set of limits into a launch command, with a best-effort
//!   rlimit/`cpulimit` implementation.
//! - **Filesystem**: volume links into a rootfs and disk accounting.
//!
//! None of this is isolation. Limits are advisory caps applied to an
//! ordinary process group.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod filesystem;
pub mod limiter;
