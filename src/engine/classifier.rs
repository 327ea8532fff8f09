//! Path Classifier
//!
//! Maps a candidate source path to at most one destination using the rule
//! table. Rules are consulted by tier (names, rename, directory, glob) and,
//! within a tier, in table order; the first match wins.
//!
//! Pure: the classifier never looks at the filesystem. Callers pass the
//! entry kind they observed.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::rules::{compile_glob, match_options, Matcher, Rule, RuleTable};
use crate::types::{ActionKind, ConflictPolicy, EntryKind};

/// Result of classifying one source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Index of the matching rule in the table
    pub rule_index: usize,
    pub destination: PathBuf,
    pub action: ActionKind,
    pub policy: ConflictPolicy,
    /// Matched by a whole-directory rule
    pub whole_directory: bool,
}

struct CompiledRule<'a> {
    index: usize,
    rule: &'a Rule,
    pattern: Option<glob::Pattern>,
}

/// Rule table prepared for matching.
pub struct Classifier<'a> {
    rules: Vec<CompiledRule<'a>>,
}

impl<'a> Classifier<'a> {
    /// Compile every glob and order rules by tier.
    pub fn new(table: &'a RuleTable) -> Result<Self> {
        let mut rules = table
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let pattern = match &rule.matcher {
                    Matcher::Glob { pattern } => Some(compile_glob(pattern)?),
                    _ => None,
                };
                Ok(CompiledRule {
                    index,
                    rule,
                    pattern,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Stable: table order is preserved within a tier.
        rules.sort_by_key(|compiled| compiled.rule.matcher.tier());

        Ok(Self { rules })
    }

    /// Classify a path relative to the project root.
    pub fn classify(&self, path: &Path, kind: EntryKind) -> Option<Classification> {
        let name = path.file_name()?.to_str()?;
        let top_level = path.components().count() == 1;

        self.rules
            .iter()
            .find(|compiled| matches(compiled, path, name, top_level, kind))
            .map(|compiled| Classification {
                rule_index: compiled.index,
                destination: compiled.rule.resolve_destination(name),
                action: compiled.rule.action,
                policy: compiled.rule.policy,
                whole_directory: matches!(compiled.rule.matcher, Matcher::Directory { .. }),
            })
    }
}

fn matches(
    compiled: &CompiledRule<'_>,
    path: &Path,
    name: &str,
    top_level: bool,
    kind: EntryKind,
) -> bool {
    match &compiled.rule.matcher {
        Matcher::Names { names } => top_level && names.iter().any(|n| n == name),
        Matcher::Rename { from, .. } => top_level && from == name,
        Matcher::Directory { name: dir } => top_level && kind.is_dir() && dir == name,
        Matcher::Glob { .. } => compiled
            .pattern
            .as_ref()
            .is_some_and(|pattern| pattern.matches_path_with(path, match_options())),
    }
}
