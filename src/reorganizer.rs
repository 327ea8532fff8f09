//! Reorganizer module
//!
//! Drives one full run over a project root: plan against the current tree,
//! scaffold the directories the plan needs, execute it, and capture the
//! resulting structure.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::engine::executor::{Executor, Outcome, RunSummary};
use crate::engine::planner::{self, MigrationPlan};
use crate::engine::scaffold;
use crate::error::Result;
use crate::listing::FsListing;
use crate::report::{ReportOptions, TreeSnapshot};
use crate::rules::RuleTable;

/// Process exit status when at least one step failed.
pub const EXIT_FAILED_STEPS: i32 = 1;
/// Process exit status when the run aborted before touching any entry.
pub const EXIT_FATAL: i32 = 2;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub plan: MigrationPlan,
    /// Directories the scaffolder had to create
    pub created_dirs: Vec<PathBuf>,
    pub outcomes: Vec<Outcome>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Exit status for this run; only step outcomes decide it.
    pub fn exit_code(&self) -> i32 {
        if self.summary.has_failures() {
            EXIT_FAILED_STEPS
        } else {
            0
        }
    }
}

/// Reorganizer bound to one project root and rule table
pub struct Reorganizer {
    listing: FsListing,
    table: RuleTable,
}

impl Reorganizer {
    pub fn new(root: impl Into<PathBuf>, table: RuleTable) -> Self {
        Self {
            listing: FsListing::new(root),
            table,
        }
    }

    pub fn root(&self) -> &Path {
        self.listing.root()
    }

    /// Plan without touching the filesystem.
    pub fn plan(&self) -> Result<MigrationPlan> {
        planner::plan(&self.listing, &self.table)
    }

    /// Plan, scaffold and execute.
    ///
    /// Rule errors and scaffolding errors abort before any entry is moved.
    /// Per-step problems end up in `RunReport::outcomes`.
    pub fn run(&self) -> Result<RunReport> {
        let plan = self.plan()?;
        info!(root = %self.root().display(), "{}", plan.summary());

        let created_dirs = scaffold::ensure_tree(self.root(), &plan.create_dirs)?;
        let outcomes = Executor::new(self.root()).execute(&plan);
        let summary = RunSummary::from_outcomes(&outcomes);
        info!(
            applied = summary.applied,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run finished"
        );

        Ok(RunReport {
            plan,
            created_dirs,
            outcomes,
            summary,
        })
    }

    /// Capture the current tree under the root.
    pub fn snapshot(&self, options: &ReportOptions) -> Result<TreeSnapshot> {
        let label = self
            .root()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root().display().to_string());
        Ok(TreeSnapshot::capture(&self.listing, &label, options)?)
    }
}
