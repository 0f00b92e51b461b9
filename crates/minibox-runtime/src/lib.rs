//! Container lifecycle management for the Minibox runtime.
//!
//! [`engine::Engine`] is the entry point; the other modules are the pieces
//! it coordinates: the on-disk [`layout`], the [`limits`] descriptor, the
//! persisted [`state`] index, [`process`] supervision and container
//! [`logs`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod engine;
pub mod layout;
pub mod limits;
pub mod logs;
pub mod process;
pub mod state;
