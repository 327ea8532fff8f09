//! Rule table handling: loading, saving and validating reorganization rules.
//!
//! A rule table is the one piece of configuration the engine depends on. It
//! is a JSON document:
//!
//! ```json
//! {
//!   "directories": ["src/core", "config", "data/databases"],
//!   "rules": [
//!     { "match": { "type": "names", "names": ["settings.json"] },
//!       "destination": "config", "policy": "overwrite" },
//!     { "match": { "type": "glob", "pattern": "*.db" },
//!       "destination": "data/databases" }
//!   ],
//!   "markers": [{ "path": "src/__init__.py", "contents": "# src package\n" }],
//!   "cleanup": ["ui_files"]
//! }
//! ```
//!
//! `action` defaults to `move` and `policy` to `skip-if-exists`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::ReorgError;
use crate::types::{ActionKind, ConflictPolicy};

/// Placeholder substituted with the matched entry's file name.
pub const NAME_PLACEHOLDER: &str = "{name}";

const GLOB_META: &[char] = &['*', '?', '['];

/// Path predicate of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Matcher {
    /// Exact top-level file names
    Names { names: Vec<String> },
    /// One top-level file, renamed on relocation
    Rename { from: String, to: String },
    /// A top-level directory relocated as a whole
    Directory { name: String },
    /// Glob over top-level entries (`*.db`) or over the children of a named
    /// directory (`ui/*.css`)
    Glob { pattern: String },
}

impl Matcher {
    /// Classifier priority: lower tiers are consulted first.
    pub fn tier(&self) -> u8 {
        match self {
            Self::Names { .. } => 1,
            Self::Rename { .. } => 2,
            Self::Directory { .. } => 3,
            Self::Glob { .. } => 4,
        }
    }

    /// Literal paths this matcher is known to match.
    fn literal_domain(&self) -> Vec<&str> {
        match self {
            Self::Names { names } => names.iter().map(String::as_str).collect(),
            Self::Rename { from, .. } => vec![from.as_str()],
            Self::Directory { name } => vec![name.as_str()],
            Self::Glob { .. } => Vec::new(),
        }
    }
}

/// One ordered reorganization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "match")]
    pub matcher: Matcher,
    /// Destination directory, or a path template containing `{name}`.
    /// For directory rules without a placeholder this is the new path of the
    /// relocated directory itself.
    pub destination: String,
    #[serde(default)]
    pub action: ActionKind,
    #[serde(default)]
    pub policy: ConflictPolicy,
    /// Remove the source directory afterwards if it ended up empty
    /// (glob collection parents and directory rules only).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prune_source: bool,
}

impl Rule {
    pub fn new(matcher: Matcher, destination: impl Into<String>) -> Self {
        Self {
            matcher,
            destination: destination.into(),
            action: ActionKind::Move,
            policy: ConflictPolicy::SkipIfExists,
            prune_source: false,
        }
    }

    pub fn with_action(mut self, action: ActionKind) -> Self {
        self.action = action;
        self
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pruning_source(mut self) -> Self {
        self.prune_source = true;
        self
    }

    /// Destination path (relative to the root) for a matched entry name.
    pub fn resolve_destination(&self, entry_name: &str) -> PathBuf {
        let name = match &self.matcher {
            Matcher::Rename { to, .. } => to.as_str(),
            _ => entry_name,
        };

        if self.destination.contains(NAME_PLACEHOLDER) {
            return PathBuf::from(self.destination.replace(NAME_PLACEHOLDER, name));
        }

        match &self.matcher {
            Matcher::Directory { .. } => PathBuf::from(&self.destination),
            _ => Path::new(&self.destination).join(name),
        }
    }

    /// Short human description used in logs and conflict errors.
    pub fn describe(&self) -> String {
        let what = match &self.matcher {
            Matcher::Names { names } if names.len() == 1 => names[0].clone(),
            Matcher::Names { names } => format!("{} names", names.len()),
            Matcher::Rename { from, to } => format!("{} as {}", from, to),
            Matcher::Directory { name } => format!("{}/", name),
            Matcher::Glob { pattern } => pattern.clone(),
        };
        format!("{} {} -> {} [{}]", self.action, what, self.destination, self.policy)
    }
}

/// File written into the new layout once transfers are done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub path: String,
    #[serde(default)]
    pub contents: String,
}

/// The complete, ordered rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// Target layout directories, created before any transfer
    #[serde(default)]
    pub directories: Vec<String>,
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    /// Extra top-level directories to remove when empty
    #[serde(default)]
    pub cleanup: Vec<String>,
}

impl RuleTable {
    /// Save the table to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize rule table to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write rule table to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load a table from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read rule table from {:?}", path.as_ref()))?;

        let table: Self =
            serde_json::from_str(&content).context("Failed to parse rule table JSON")?;

        Ok(table)
    }

    /// Paths that are never classified as sources: layout directories, their
    /// ancestors, and marker files.
    pub fn protected_paths(&self) -> BTreeSet<PathBuf> {
        let mut protected = BTreeSet::new();
        for dir in &self.directories {
            let mut current = Some(Path::new(dir));
            while let Some(path) = current {
                if path.as_os_str().is_empty() {
                    break;
                }
                protected.insert(path.to_path_buf());
                current = path.parent();
            }
        }
        protected.extend(self.markers.iter().map(|m| PathBuf::from(&m.path)));
        protected
    }

    /// Validate the table.
    ///
    /// Returns the list of non-fatal warnings (redundant duplicate rules).
    ///
    /// # Errors
    ///
    /// - `Config`: empty matcher, absolute or escaping paths, wildcard parents
    /// - `Pattern`: glob that does not compile
    /// - `RuleConflict`: two rules provably match the same path but resolve
    ///   to a different destination or action kind
    pub fn validate(&self) -> crate::error::Result<Vec<String>> {
        for dir in &self.directories {
            check_relative("directory", dir).map_err(ReorgError::config)?;
        }
        for marker in &self.markers {
            check_relative("marker", &marker.path).map_err(ReorgError::config)?;
        }
        for dir in &self.cleanup {
            check_single_component("cleanup entry", dir).map_err(ReorgError::config)?;
        }

        for (index, rule) in self.rules.iter().enumerate() {
            validate_rule(index, rule)?;
        }

        self.check_overlaps()
    }

    fn check_overlaps(&self) -> crate::error::Result<Vec<String>> {
        let mut warnings = Vec::new();

        for (i, rule) in self.rules.iter().enumerate() {
            if let Matcher::Names { names } = &rule.matcher {
                let mut seen = BTreeSet::new();
                for name in names {
                    if !seen.insert(name) {
                        warnings.push(format!("rule #{} lists '{}' more than once", i, name));
                    }
                }
            }
        }

        for (i, first) in self.rules.iter().enumerate() {
            for (j, second) in self.rules.iter().enumerate().skip(i + 1) {
                for path in shared_domain(first, second)? {
                    let name = Path::new(&path)
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or(path.as_str())
                        .to_string();
                    let same_outcome = first.resolve_destination(&name)
                        == second.resolve_destination(&name)
                        && first.action == second.action;

                    if !same_outcome {
                        return Err(ReorgError::RuleConflict {
                            path,
                            first: i,
                            first_desc: first.describe(),
                            second: j,
                            second_desc: second.describe(),
                        });
                    }
                    warnings.push(format!(
                        "rules #{} and #{} both match '{}'; #{} is never used for it",
                        i, j, path, j
                    ));
                }
            }
        }

        Ok(warnings)
    }
}

/// Concrete paths that both rules provably match.
fn shared_domain(first: &Rule, second: &Rule) -> crate::error::Result<Vec<String>> {
    let mut shared = Vec::new();

    let first_literals = first.matcher.literal_domain();
    let second_literals = second.matcher.literal_domain();
    for literal in &first_literals {
        if second_literals.contains(literal) {
            shared.push((*literal).to_string());
        }
    }

    match (&first.matcher, &second.matcher) {
        (Matcher::Glob { pattern: a }, Matcher::Glob { pattern: b }) if a == b => {
            shared.push(a.clone());
        }
        (Matcher::Glob { pattern }, _) => {
            shared.extend(glob_hits(pattern, &second_literals)?);
        }
        (_, Matcher::Glob { pattern }) => {
            shared.extend(glob_hits(pattern, &first_literals)?);
        }
        _ => {}
    }

    Ok(shared)
}

fn glob_hits(pattern: &str, literals: &[&str]) -> crate::error::Result<Vec<String>> {
    let compiled = compile_glob(pattern)?;
    Ok(literals
        .iter()
        .filter(|literal| compiled.matches_with(literal, match_options()))
        .map(|literal| (*literal).to_string())
        .collect())
}

/// Compile a rule glob, mapping failures to `ReorgError::Pattern`.
pub fn compile_glob(pattern: &str) -> crate::error::Result<glob::Pattern> {
    glob::Pattern::new(pattern).map_err(|source| ReorgError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Glob options used everywhere: `*` stays within one path component and
/// never matches hidden entries.
pub fn match_options() -> glob::MatchOptions {
    glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

/// Literal directory part of a glob (`ui` for `ui/*.css`), if any.
pub fn glob_parent(pattern: &str) -> Option<PathBuf> {
    Path::new(pattern)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

fn validate_rule(index: usize, rule: &Rule) -> crate::error::Result<()> {
    let context = |msg: String| ReorgError::config(format!("rule #{}: {}", index, msg));

    match &rule.matcher {
        Matcher::Names { names } => {
            if names.is_empty() {
                return Err(context("names list is empty".to_string()));
            }
            for name in names {
                check_single_component("name", name).map_err(context)?;
            }
        }
        Matcher::Rename { from, to } => {
            check_single_component("rename source", from).map_err(context)?;
            check_single_component("rename target", to).map_err(context)?;
        }
        Matcher::Directory { name } => {
            check_single_component("directory", name).map_err(context)?;
        }
        Matcher::Glob { pattern } => {
            check_relative("glob", pattern).map_err(context)?;
            compile_glob(pattern)?;
            if let Some(parent) = glob_parent(pattern) {
                if parent.to_string_lossy().contains(GLOB_META) {
                    return Err(context(format!(
                        "glob '{}' may only use wildcards in its last component",
                        pattern
                    )));
                }
            }
        }
    }

    check_relative("destination", &rule.destination).map_err(context)?;

    if rule.prune_source
        && !matches!(
            &rule.matcher,
            Matcher::Directory { .. } | Matcher::Glob { .. }
        )
    {
        return Err(context(
            "prune_source applies to directory and glob rules only".to_string(),
        ));
    }
    if let Matcher::Glob { pattern } = &rule.matcher {
        if rule.prune_source && glob_parent(pattern).is_none() {
            return Err(context(format!(
                "glob '{}' has no source directory to prune",
                pattern
            )));
        }
    }

    Ok(())
}

/// A non-empty relative path that stays inside the root.
fn check_relative(what: &str, value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", what));
    }
    let escapes = Path::new(value)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(format!(
            "{} '{}' must be a relative path inside the project root",
            what, value
        ));
    }
    Ok(())
}

fn check_single_component(what: &str, value: &str) -> std::result::Result<(), String> {
    check_relative(what, value)?;
    if Path::new(value).components().count() != 1 {
        return Err(format!("{} '{}' must be a single top-level name", what, value));
    }
    Ok(())
}
