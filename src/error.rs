//! Error handling module for reorg
//!
//! Provides the fatal error taxonomy using thiserror. Per-action problems are
//! not errors: they are recorded as outcome statuses by the executor and never
//! interrupt a run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for reorg
#[derive(Error, Debug)]
pub enum ReorgError {
    /// The destination tree cannot be scaffolded (aborts before any move)
    #[error("Setup error at {path}: {reason}")]
    Setup { path: PathBuf, reason: String },

    /// Two rules claim the same concrete path with incompatible outcomes
    #[error("Rule conflict on '{path}': rule #{first} ({first_desc}) and rule #{second} ({second_desc})")]
    RuleConflict {
        path: String,
        first: usize,
        first_desc: String,
        second: usize,
        second_desc: String,
    },

    /// Malformed rule table (bad destination, empty matcher, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Glob pattern that does not compile
    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// IO errors while reading the current tree
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for reorg operations
pub type Result<T> = std::result::Result<T, ReorgError>;

impl ReorgError {
    /// Create a setup error for a path that cannot become a directory
    pub fn setup(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Setup {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors that are detected before the filesystem is touched.
    pub fn is_plan_time(&self) -> bool {
        matches!(
            self,
            Self::RuleConflict { .. } | Self::Config(_) | Self::Pattern { .. }
        )
    }
}
