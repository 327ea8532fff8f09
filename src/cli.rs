use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Reorg - migrate a flat project directory into a fixed layout
#[derive(Parser)]
#[command(name = "reorg")]
#[command(about = "Reorganize a flat project directory according to a rule table")]
#[command(version)]
pub struct Cli {
    /// Project root to reorganize
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// JSON rule table to use instead of the built-in layout
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Dry-run mode: print the plan without touching the filesystem.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Deepest directory level shown in the structure report
    #[arg(long, global = true, default_value_t = 4)]
    pub max_depth: usize,

    /// Files shown per directory in the structure report
    #[arg(long, global = true, default_value_t = 10)]
    pub max_entries: usize,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Plan, scaffold, migrate and print the resulting tree (default)
    Run,
    /// Print the migration plan without executing it
    Plan,
    /// Print the current structure of the project root
    Tree,
    /// Validate a rule table file
    Validate {
        /// Path to the rule table to validate
        file: PathBuf,
    },
    /// Write the built-in rule table as JSON for editing
    InitRules {
        /// Destination file
        output: PathBuf,
        /// Replace the file if it already exists
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Subcommand to run; no subcommand means `run`.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
