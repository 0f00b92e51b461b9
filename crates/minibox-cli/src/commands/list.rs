//! `mbx list`: List tracked containers.

use minibox_common::error::Result;
use minibox_runtime::engine::Engine;

/// Executes the `list` command.
///
/// # Errors
///
/// Returns an error if the state index cannot be read.
pub fn execute(engine: &Engine) -> Result<()> {
    let containers = engine.list()?;
    if containers.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    println!("{:<24} {:<10} {:<8}", "NAME", "STATUS", "PID");
    for c in &containers {
        println!(
            "{:<24} {:<10} {:<8}",
            c.name.as_str(),
            c.status.to_string(),
            c.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
        );
    }
    Ok(())
}
