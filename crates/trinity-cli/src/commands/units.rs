//! Units command - Inspect, run and evolve built-in units
//!
//! Usage:
//! ```bash
//! trinity units list
//! trinity units schema math --format array
//! trinity units run calculator add 2 3
//! trinity units run calculator divide '{"a": 1, "b": 4}' --strict
//! trinity units lineage calculator --evolve calc-two,calc-three
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde_json::Value;
use std::time::{Duration, Instant};

use trinity_core::{SchemaRegistry, UnitCore, UnitError};

use super::catalogue::{BuiltinUnit, BUILTIN};
use crate::{print_success, print_warning};

/// Arguments for the units command
#[derive(Args)]
pub struct UnitsArgs {
    #[command(subcommand)]
    command: UnitsCommand,
}

#[derive(Subcommand)]
pub enum UnitsCommand {
    /// List all built-in units and their capabilities
    #[command(name = "list")]
    List,

    /// Export the tool schemas of a unit
    #[command(name = "schema")]
    Schema {
        /// Name of the unit
        unit: String,

        /// Export shape
        #[arg(long, value_enum, default_value_t = SchemaFormat::Json)]
        format: SchemaFormat,
    },

    /// Run a capability
    #[command(name = "run")]
    Run {
        /// Name of the unit
        unit: String,

        /// Capability to run (learned ones are "<teacher>.<name>")
        capability: String,

        /// Arguments, each parsed as JSON (plain strings otherwise)
        args: Vec<String>,

        /// Validate input and output against the schema (one JSON object argument)
        #[arg(long)]
        strict: bool,

        /// Abort if the capability takes longer than this
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Output raw JSON (no formatting)
        #[arg(long)]
        raw: bool,
    },

    /// Evolve a unit one or more times and show its lineage
    #[command(name = "lineage")]
    Lineage {
        /// Name of the unit
        unit: String,

        /// Ids to evolve into, in order
        #[arg(long, value_delimiter = ',', required = true)]
        evolve: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaFormat {
    /// Object keyed by capability name
    Json,
    /// Ordered list of tool definitions
    Array,
    /// Table of names, descriptions and required parameters
    Record,
}

/// Run the units command
pub async fn run(args: UnitsArgs) -> Result<()> {
    match args.command {
        UnitsCommand::List => list_units(),
        UnitsCommand::Schema { unit, format } => show_schema(&unit, format),
        UnitsCommand::Run {
            unit,
            capability,
            args,
            strict,
            timeout_ms,
            raw,
        } => run_capability(&unit, &capability, &args, strict, timeout_ms, raw).await,
        UnitsCommand::Lineage { unit, evolve } => show_lineage(&unit, &evolve),
    }
}

/// List all built-in units
fn list_units() -> Result<()> {
    println!("{}", "🧬 Trinity Built-in Units".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Unit").fg(Color::Cyan),
            Cell::new("Version").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
            Cell::new("Capabilities").fg(Color::Cyan),
        ]);

    for ((name, summary), unit) in BUILTIN.iter().zip(BuiltinUnit::all(false)?) {
        let core = unit.core();
        table.add_row(vec![
            Cell::new(name).fg(Color::Green),
            Cell::new(core.dna().version()),
            Cell::new(summary),
            Cell::new(core.capabilities().list().join(", ")).fg(Color::Yellow),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "Run a capability: {}",
        "trinity units run <unit> <capability> [ARGS..]".green()
    );
    println!("Show schemas: {}", "trinity units schema <unit>".green());

    Ok(())
}

/// Export the schemas of a unit
fn show_schema(name: &str, format: SchemaFormat) -> Result<()> {
    let unit = BuiltinUnit::load(name, false)?;
    let schema = unit.core().schema();

    match format {
        SchemaFormat::Json => println!("{}", serde_json::to_string_pretty(&schema.to_json())?),
        SchemaFormat::Array => println!("{}", serde_json::to_string_pretty(&schema.to_array())?),
        SchemaFormat::Record => print_record(unit.core().whoami(), schema),
    }

    Ok(())
}

fn print_record(whoami: String, schema: &SchemaRegistry) {
    println!("{} {}", "📋".cyan(), whoami.bold());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
            Cell::new("Required").fg(Color::Cyan),
        ]);

    for (name, tool) in schema.to_record() {
        table.add_row(vec![
            Cell::new(name).fg(Color::Green),
            Cell::new(tool.description),
            Cell::new(tool.parameters.required.join(", ")).fg(Color::Yellow),
        ]);
    }

    println!("{table}");
}

/// Parse one command-line argument as JSON, keeping it as a string otherwise
fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

/// Run a capability of a built-in unit
async fn run_capability(
    name: &str,
    capability: &str,
    args: &[String],
    strict: bool,
    timeout_ms: Option<u64>,
    raw: bool,
) -> Result<()> {
    let unit = BuiltinUnit::load(name, strict)?;
    let core = unit.core();
    let args: Vec<Value> = args.iter().map(|arg| parse_arg(arg)).collect();

    if !raw {
        println!(
            "{} Running '{}' on {}...",
            "⚙".blue(),
            capability.green(),
            core.dna().to_string().cyan()
        );
        println!();
    }

    let started = Instant::now();
    let execution = execute(core, capability, args, strict);
    let output = match timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), execution)
            .await
            .map_err(|_| UnitError::Timeout {
                unit: core.id().to_string(),
                name: capability.to_string(),
                timeout_ms: ms,
            })?,
        None => execution.await,
    }
    .with_context(|| format!("Capability '{}' execution failed", capability))?;

    if raw {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", "Result:".bold());
        println!("{}", serde_json::to_string_pretty(&output)?);
        println!();
        println!(
            "{} {}ms",
            "Execution time:".dimmed(),
            started.elapsed().as_millis()
        );
    }

    Ok(())
}

/// Raw execution, or validated execution of a single object argument
async fn execute(core: &UnitCore, capability: &str, args: Vec<Value>, strict: bool) -> Result<Value> {
    if !strict {
        return Ok(core.execute(capability, args).await?);
    }
    let input = match args.as_slice() {
        [input @ Value::Object(_)] => input.clone(),
        _ => bail!("--strict expects exactly one JSON object argument"),
    };
    Ok(core.execute_validated(capability, input).await?)
}

/// Evolve a unit through `ids` and print every generation
fn show_lineage(name: &str, ids: &[String]) -> Result<()> {
    let mut unit = BuiltinUnit::load(name, false)?;
    for id in ids {
        unit = unit
            .evolve(id)
            .with_context(|| format!("Evolution into '{}' failed", id))?;
    }

    let core = unit.core();
    print_success(&core.whoami());
    println!();

    println!("{}", "Lineage:".bold());
    println!("  {} {}", "●".green(), core.dna().to_string().green());
    for ancestor in core.dna().lineage() {
        println!("  {} {}", "↑".dimmed(), ancestor);
    }
    println!();

    println!(
        "{} {}",
        "Capabilities:".bold(),
        core.capabilities().size().to_string().yellow()
    );
    for capability in core.capabilities().list() {
        println!("  {} {}", "•".cyan(), capability);
    }

    if !core.is_valid() {
        print_warning(&core.validator().consistency().describe());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("2"), json!(2));
        assert_eq!(parse_arg(r#"{"a": 1}"#), json!({"a": 1}));
        assert_eq!(parse_arg("hello"), json!("hello"));
    }

    #[tokio::test]
    async fn test_run_rejects_strict_without_object() {
        let err = run_capability("calculator", "add", &["2".into(), "3".into()], true, None, true)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("exactly one JSON object"));
    }

    #[tokio::test]
    async fn test_run_unknown_capability() {
        let err = run_capability("math", "add", &[], false, None, true)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("[math] Capability 'add' not found"));
    }

    #[test]
    fn test_lineage_rejects_bad_id() {
        let err = show_lineage("calculator", &["Calc Two".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid unit id"));
    }
}
