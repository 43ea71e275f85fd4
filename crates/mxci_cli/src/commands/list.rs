//! List command - Print the supported platforms.

use anyhow::Result;

use super::catalog;

/// Platform list as printed by `--list` and the help screen.
pub fn format_platforms(platforms: &[String]) -> String {
    format!("\nSupported platforms:\n{}", platforms.join("\n"))
}

pub fn execute() -> Result<()> {
    println!("{}", format_platforms(&catalog().platforms()));
    Ok(())
}
