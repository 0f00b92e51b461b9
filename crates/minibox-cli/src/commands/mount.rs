//! `mbx mount`: Link a host path into a container.

use std::path::PathBuf;

use clap::Args;
use minibox_common::error::Result;
use minibox_common::types::ContainerName;
use minibox_runtime::engine::{Engine, MountOutcome};

/// Arguments for the `mount` command.
#[derive(Args, Debug)]
pub struct MountArgs {
    /// Container name.
    pub name: String,

    /// Path on the host to expose.
    pub host_path: PathBuf,

    /// Path inside the container, relative to its rootfs.
    pub container_path: PathBuf,
}

/// Executes the `mount` command.
///
/// # Errors
///
/// Returns an error if the link cannot be created.
pub fn execute(engine: &Engine, args: &MountArgs) -> Result<()> {
    let name: ContainerName = args.name.parse()?;
    match engine.mount_volume(&name, &args.host_path, &args.container_path)? {
        MountOutcome::Linked { target } => println!(
            "Mounted {} -> {}",
            args.host_path.display(),
            target.display()
        ),
        MountOutcome::NotFound => super::not_found(&name),
    }
    Ok(())
}
