//! CLI command definitions and dispatch.

pub mod create;
pub mod disk;
pub mod list;
pub mod logs;
pub mod mount;
pub mod run;
pub mod stop;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use minibox_common::config::MiniboxConfig;
use minibox_common::constants::{DATA_DIR_ENV, DEFAULT_DATA_DIR};
use minibox_common::error::Result;
use minibox_common::types::ContainerName;
use minibox_runtime::engine::Engine;

/// Minibox: a minimal daemon-less container lifecycle manager.
#[derive(Parser, Debug)]
#[command(name = "mbx", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding `state.json` and `containers/`.
    #[arg(long, global = true, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a container, optionally seeding its rootfs from an archive.
    Create(create::CreateArgs),
    /// Launch a container's entry point.
    Run(run::RunArgs),
    /// Signal a container's process group to terminate.
    Stop(stop::StopArgs),
    /// List tracked containers.
    List,
    /// Report a container's disk usage against its quota.
    Disk(disk::DiskArgs),
    /// Link a host path into a container.
    Mount(mount::MountArgs),
    /// Print a container's log.
    Logs(logs::LogsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// Failures the runtime can recover from are printed and swallowed; the
/// rest propagate.
///
/// # Errors
///
/// Returns an error if the command hits a fatal runtime error.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    tracing::debug!(command = ?cli.command, data_dir = %cli.data_dir.display(), "dispatching");
    let engine = Engine::new(MiniboxConfig::from_data_dir(cli.data_dir));
    let result = match cli.command {
        Command::Create(args) => create::execute(&engine, args),
        Command::Run(args) => run::execute(&engine, &args),
        Command::Stop(args) => stop::execute(&engine, &args),
        Command::List => list::execute(&engine),
        Command::Disk(args) => disk::execute(&engine, &args),
        Command::Mount(args) => mount::execute(&engine, &args),
        Command::Logs(args) => logs::execute(&engine, &args),
    };
    report(result)
}

fn report(result: Result<()>) -> anyhow::Result<()> {
    match result {
        Err(e) if e.is_recoverable() => {
            println!("Error: {e}");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e)),
        Ok(()) => Ok(()),
    }
}

/// Prints the standard message for an unknown container.
fn not_found(name: &ContainerName) {
    println!("Container '{name}' does not exist.");
}
