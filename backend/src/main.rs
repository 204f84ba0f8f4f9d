//! Better Comp CLI - Describe the base workbook and dry-run the import pipeline
//!
//! # Commands
//!
//! ```bash
//! bettercomp describe                         # Print the workbook descriptor JSON
//! bettercomp compute SalaryRange rows.json    # Compute records, print them as JSON
//! bettercomp check Jobs rows.json             # Compute + contract check (exit 1 on problems)
//! bettercomp json-schema SalaryRange          # Print the per-record JSON Schema
//! bettercomp operations                       # Show available field operations
//! ```
//!
//! Global flags `--workbook FILE` and `--unique-policy` override the
//! `BETTERCOMP_*` environment settings.

use clap::{Parser, Subcommand};
use bettercomp::logs::{log_error, log_info, log_success};
use bettercomp::{
    compute_batch, json_schema, operations_description, records_from_json, run_sheet,
    PipelineResult, Settings, UniquePolicy, Workbook,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bettercomp")]
#[command(about = "Better Comp import workbook: describe, compute and check records", long_about = None)]
struct Cli {
    /// Workbook JSON file (default: built-in base workbook)
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Uniqueness policy for salary ranges
    #[arg(long, global = true, value_enum)]
    unique_policy: Option<UniquePolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the workbook descriptor JSON
    Describe {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the compute pipeline over a JSON array of records
    Compute {
        /// Sheet name (e.g. SalaryRange, Jobs)
        sheet: String,

        /// Input JSON file (array of objects)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not fill declared defaults into blank fields
        #[arg(long)]
        no_defaults: bool,
    },

    /// Compute records, then check them against the sheet contract
    Check {
        /// Sheet name
        sheet: String,

        /// Input JSON file (array of objects)
        input: PathBuf,
    },

    /// Print the JSON Schema of a sheet's records
    JsonSchema {
        /// Sheet name
        sheet: String,
    },

    /// Show available field operations
    Operations,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Operations => cmd_operations(),
        command => settings(cli.workbook, cli.unique_policy).and_then(|settings| run(command, settings)),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log_error(format!("❌ Error: {}", e));
            std::process::exit(1);
        }
    }
}

/// Environment settings, overridden by CLI flags
fn settings(workbook: Option<PathBuf>, unique_policy: Option<UniquePolicy>) -> PipelineResult<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(path) = workbook {
        settings.workbook_path = Some(path);
    }
    if let Some(policy) = unique_policy {
        settings.unique_policy = policy;
    }
    Ok(settings)
}

/// Run a workbook command; `Ok(false)` means the run found problems
fn run(command: Commands, mut settings: Settings) -> PipelineResult<bool> {
    if matches!(command, Commands::Compute { no_defaults: true, .. }) {
        settings.apply_defaults = false;
    }
    let workbook = settings.workbook()?;

    match command {
        Commands::Describe { output } => cmd_describe(&workbook, output.as_deref()),
        Commands::Compute { sheet, input, output, .. } => {
            cmd_compute(&workbook, &settings, &sheet, &input, output.as_deref())
        }
        Commands::Check { sheet, input } => cmd_check(&workbook, &settings, &sheet, &input),
        Commands::JsonSchema { sheet } => cmd_json_schema(&workbook, &sheet),
        Commands::Operations => cmd_operations(),
    }
}

fn cmd_describe(workbook: &Workbook, output: Option<&Path>) -> PipelineResult<bool> {
    log_info(format!(
        "📋 {} ({}): {}",
        workbook.name(),
        workbook.namespace(),
        workbook.sheet_names().join(", ")
    ));
    write_output(&workbook.to_json()?, output)?;
    Ok(true)
}

fn cmd_compute(
    workbook: &Workbook,
    settings: &Settings,
    sheet: &str,
    input: &Path,
    output: Option<&Path>,
) -> PipelineResult<bool> {
    let sheet = workbook.require_sheet(sheet)?;
    log_info(format!("📄 Processing: {}", input.display()));

    let rows = records_from_json(&fs::read_to_string(input)?)?;
    let result = compute_batch(sheet, rows, &settings.compute_options());
    log_success(format!("⚙️  {}", result.summary()));

    let records: Vec<Value> = result.records.into_iter().map(|r| r.into_value()).collect();
    write_output(&serde_json::to_string_pretty(&records)?, output)?;

    Ok(result.faults.is_empty())
}

fn cmd_check(workbook: &Workbook, settings: &Settings, sheet: &str, input: &Path) -> PipelineResult<bool> {
    let sheet = workbook.require_sheet(sheet)?;
    log_info(format!("📄 Processing: {}", input.display()));

    let rows = records_from_json(&fs::read_to_string(input)?)?;
    let run = run_sheet(sheet, rows, &settings.compute_options());

    let report = serde_json::json!({
        "sheet": run.sheet,
        "checked": run.report.checked,
        "faults": run.faults,
        "violations": run.report.violations,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(run.is_clean())
}

fn cmd_json_schema(workbook: &Workbook, sheet: &str) -> PipelineResult<bool> {
    let sheet = workbook.require_sheet(sheet)?;
    println!("{}", serde_json::to_string_pretty(&json_schema(sheet))?);
    Ok(true)
}

fn cmd_operations() -> PipelineResult<bool> {
    println!("{}", operations_description());
    Ok(true)
}

fn write_output(content: &str, path: Option<&Path>) -> PipelineResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_info(format!("💾 Output written to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
