//! Reorg Library
//!
//! A declarative engine that migrates a flat project directory into a fixed
//! layout: classify entries with a rule table, plan the migration, scaffold
//! the target tree, execute, and report the resulting structure.

pub mod cli;
pub mod engine;
pub mod error;
pub mod layout;
pub mod listing;
pub mod reorganizer;
pub mod report;
pub mod rules;
pub mod types;

// Re-export main types for convenience
pub use engine::classifier::{Classification, Classifier};
pub use engine::executor::{Executor, Outcome, RunSummary, SkipReason, Status, Step};
pub use engine::planner::{plan, Action, MarkerWrite, MigrationPlan};
pub use engine::scaffold::ensure_tree;
pub use error::{ReorgError, Result};
pub use layout::default_rule_table;
pub use listing::{DirectoryListing, FsListing, ListedEntry, MemoryListing};
pub use reorganizer::{Reorganizer, RunReport};
pub use report::{ReportOptions, TreeSnapshot};
pub use rules::{Marker, Matcher, Rule, RuleTable};
pub use types::{ActionKind, ConflictPolicy, EntryKind};
