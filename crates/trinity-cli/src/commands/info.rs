//! Info command - Show system information
//!
//! Usage:
//! ```bash
//! trinity info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::catalogue::BUILTIN;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    println!("{}", "Trinity - Teachable Runtime Units".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Features:".bold());
    println!("  {} Capabilities paired with tool schemas", "✓".green());
    println!("  {} Namespaced teaching and learning", "✓".green());
    println!("  {} Strict-mode input and output validation", "✓".green());
    println!("  {} Evolution with versioned lineage", "✓".green());
    println!();

    println!("{}", "Built-in Units:".bold());
    for (name, summary) in BUILTIN {
        println!("  {} {} {}", "•".cyan(), name.green(), summary.dimmed());
    }
    println!();

    println!("{}", "Configuration:".bold());
    println!(
        "  {} {} unit version (default: 1.0.0)",
        "ℹ".blue(),
        "TRINITY_UNIT_VERSION".yellow()
    );
    println!(
        "  {} {} strict mode for every unit (1/true)",
        "ℹ".blue(),
        "TRINITY_STRICT".yellow()
    );
    println!(
        "  {} {} log filter, overrides -v",
        "ℹ".blue(),
        "RUST_LOG".yellow()
    );
    println!();

    Ok(())
}
