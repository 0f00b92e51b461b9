//! `mbx run`: Launch a container's entry point.

use clap::Args;
use minibox_common::error::Result;
use minibox_common::types::ContainerName;
use minibox_runtime::engine::{Engine, RunOutcome};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or state cannot be
/// persisted.
pub fn execute(engine: &Engine, args: &RunArgs) -> Result<()> {
    let name: ContainerName = args.name.parse()?;
    match engine.run(&name)? {
        RunOutcome::Started { pid } => {
            println!("Container '{name}' started (pgid {pid})");
        }
        RunOutcome::AlreadyRunning { pid } => {
            println!("Container '{name}' is already running (pgid {pid}).");
        }
        RunOutcome::NotFound => super::not_found(&name),
    }
    Ok(())
}
