//! `mbx logs`: View container logs.

use clap::Args;
use minibox_common::error::Result;
use minibox_common::types::ContainerName;
use minibox_runtime::engine::Engine;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `logs` command.
///
/// # Errors
///
/// Returns an error if the log exists but cannot be read.
pub fn execute(engine: &Engine, args: &LogsArgs) -> Result<()> {
    let name: ContainerName = args.name.parse()?;
    match engine.logs(&name)? {
        None => super::not_found(&name),
        Some(logs) if logs.is_empty() => {
            println!("No logs available for container: {name}");
        }
        Some(logs) => print!("{logs}"),
    }
    Ok(())
}
