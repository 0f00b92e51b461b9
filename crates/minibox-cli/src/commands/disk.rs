//! `mbx disk`: Report disk usage against the quota.

use clap::Args;
use minibox_common::error::Result;
use minibox_common::types::ContainerName;
use minibox_runtime::engine::{DiskOutcome, Engine};

use crate::output::{format_bytes, percent_of};

/// Arguments for the `disk` command.
#[derive(Args, Debug)]
pub struct DiskArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `disk` command.
///
/// # Errors
///
/// Returns an error if the rootfs cannot be walked or the limit descriptor
/// cannot be read.
pub fn execute(engine: &Engine, args: &DiskArgs) -> Result<()> {
    let name: ContainerName = args.name.parse()?;
    let usage = match engine.disk_usage(&name)? {
        DiskOutcome::Usage(usage) => usage,
        DiskOutcome::NotFound => {
            super::not_found(&name);
            return Ok(());
        }
    };

    println!(
        "Container '{name}': {} / {} ({})",
        format_bytes(usage.used_bytes),
        format_bytes(usage.limit_bytes),
        percent_of(usage.used_bytes, usage.limit_bytes),
    );
    if usage.over_quota() {
        println!("Warning: disk quota exceeded.");
    }
    Ok(())
}
