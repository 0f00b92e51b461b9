//! `mbx stop`: Terminate a container's process group.

use clap::Args;
use minibox_common::error::Result;
use minibox_common::types::ContainerName;
use minibox_runtime::engine::{Engine, StopOutcome};

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `stop` command.
///
/// Sends `SIGTERM` and returns without waiting for the processes to exit.
///
/// # Errors
///
/// Returns an error if signaling fails unexpectedly or state cannot be
/// persisted.
pub fn execute(engine: &Engine, args: &StopArgs) -> Result<()> {
    let name: ContainerName = args.name.parse()?;
    match engine.stop(&name)? {
        StopOutcome::Stopped { pid } => {
            println!("Container '{name}' stopped (signaled pgid {pid})");
        }
        StopOutcome::StoppedAlreadyDead { pid } => {
            println!("Container '{name}' was already dead (pgid {pid}); marked stopped.");
        }
        StopOutcome::NotRunning => println!("Container '{name}' is not running."),
        StopOutcome::NotFound => super::not_found(&name),
    }
    Ok(())
}
