//! Reorg - Main entry point
//!
//! Exit status: 0 when every step succeeded or was skipped, 1 when at least
//! one step failed, 2 when the run was aborted before touching any entry
//! (invalid rules, unusable root, scaffolding failure).

use anyhow::{bail, Context};
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use reorg::cli::{Cli, Commands};
use reorg::layout::default_rule_table;
use reorg::report::ReportOptions;
use reorg::reorganizer::{Reorganizer, EXIT_FATAL};
use reorg::rules::RuleTable;

/// Initialize the logger with appropriate settings
fn init_logger(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // RUST_LOG overrides -v
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed");

    let code = match dispatch(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            EXIT_FATAL
        }
    };
    process::exit(code);
}

fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
    match cli.command() {
        Commands::Run if cli.dry_run => print_plan(cli),
        Commands::Run => run(cli),
        Commands::Plan => print_plan(cli),
        Commands::Tree => print_tree(cli),
        Commands::Validate { file } => validate(&file),
        Commands::InitRules { output, force } => init_rules(cli, &output, force),
    }
}

fn load_rules(cli: &Cli) -> anyhow::Result<RuleTable> {
    match &cli.rules {
        Some(path) => {
            info!("Loading rule table from: {:?}", path);
            RuleTable::load_from_file(path)
        }
        None => Ok(default_rule_table()),
    }
}

fn reorganizer(cli: &Cli) -> anyhow::Result<Reorganizer> {
    if !cli.root.is_dir() {
        bail!("Project root {:?} is not a directory", cli.root);
    }
    Ok(Reorganizer::new(&cli.root, load_rules(cli)?))
}

fn report_options(cli: &Cli) -> ReportOptions {
    ReportOptions {
        max_depth: cli.max_depth,
        max_entries: cli.max_entries,
        ..ReportOptions::default()
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let reorg = reorganizer(cli)?;
    let report = reorg.run()?;

    for warning in &report.plan.warnings {
        println!("! {}", warning);
    }
    for dir in &report.created_dirs {
        println!("+ {}/", dir.display());
    }
    for outcome in &report.outcomes {
        println!("{}", outcome);
    }

    // The run is already committed: a report failure must not mask it.
    println!("\n📁 Project structure:");
    match reorg.snapshot(&report_options(cli)) {
        Ok(snapshot) => print!("{}", snapshot.render()),
        Err(e) => {
            error!("Cannot render project structure: {}", e);
            println!("✗ Cannot render project structure: {}", e);
        }
    }

    println!("\n{}", report.summary);
    if report.summary.has_failures() {
        println!("✗ Reorganization finished with failures");
    } else {
        println!("✓ Reorganization completed");
    }
    Ok(report.exit_code())
}

fn print_plan(cli: &Cli) -> anyhow::Result<i32> {
    let plan = reorganizer(cli)?.plan()?;
    println!("{}", plan.summary());
    if plan.is_noop() {
        println!("✓ Nothing to do: the project already matches the layout");
    }
    Ok(0)
}

fn print_tree(cli: &Cli) -> anyhow::Result<i32> {
    let snapshot = reorganizer(cli)?.snapshot(&report_options(cli))?;
    print!("{}", snapshot.render());
    Ok(0)
}

fn validate(path: &std::path::Path) -> anyhow::Result<i32> {
    info!("Validating rule table: {:?}", path);
    let table = RuleTable::load_from_file(path)?;
    let warnings = table
        .validate()
        .with_context(|| format!("Rule table {:?} is invalid", path))?;

    for warning in &warnings {
        println!("! {}", warning);
    }
    println!(
        "✓ Rule table is valid: {} rule(s), {} director(ies), {} marker(s)",
        table.rules.len(),
        table.directories.len(),
        table.markers.len()
    );
    Ok(0)
}

fn init_rules(cli: &Cli, output: &std::path::Path, force: bool) -> anyhow::Result<i32> {
    let table = default_rule_table();
    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(0);
    }
    if output.exists() && !force {
        bail!("{:?} already exists (use --force to replace it)", output);
    }
    table.save_to_file(output)?;
    println!("✓ Wrote built-in rule table to {:?}", output);
    Ok(0)
}
