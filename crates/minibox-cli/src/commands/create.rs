//! `mbx create`: Create a container.

use std::path::PathBuf;

use clap::Args;
use minibox_common::error::Result;
use minibox_common::types::ContainerName;
use minibox_runtime::engine::{CreateOutcome, Engine};

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Container name.
    pub name: String,

    /// Tar or tar.gz archive to unpack into the rootfs.
    pub archive: Option<PathBuf>,
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns an error if the layout or state index cannot be written.
pub fn execute(engine: &Engine, args: CreateArgs) -> Result<()> {
    let name: ContainerName = args.name.parse()?;
    match engine.create(&name, args.archive.as_deref())? {
        CreateOutcome::Created { rootfs } => {
            println!("Container '{name}' created at {}", rootfs.display());
        }
        CreateOutcome::AlreadyExists => {
            println!("Container '{name}' already exists.");
        }
    }
    Ok(())
}
