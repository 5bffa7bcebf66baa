//! Trinity CLI - Command-line interface for runtime units
//!
//! # Usage
//!
//! ```bash
//! # List the built-in units
//! trinity units list
//!
//! # Run a capability with positional arguments
//! trinity units run math calculator.add 2 3
//!
//! # Run through the validator with schema checks
//! trinity units run calculator divide '{"a": 1, "b": 4}' --strict
//!
//! # Evolve a unit and print its lineage
//! trinity units lineage calculator --evolve calc-two,calc-three
//!
//! # Show version and configuration
//! trinity info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{info, units};

/// Trinity - units that teach, learn and evolve
///
/// Command-line interface for inspecting and exercising units.
#[derive(Parser)]
#[command(
    name = "trinity",
    version,
    about = "Trinity CLI - Teachable Runtime Units",
    long_about = "Trinity units declare capabilities together with tool schemas.\n\n\
                  Units teach their capabilities to other units, learn them under\n\
                  a namespace, and evolve into new versions that keep their lineage."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and run built-in units
    #[command(name = "units")]
    Units(units::UnitsArgs),

    /// Show system information
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Units(args) => units::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}
