//! Migration Planner
//!
//! Combines classifier output with the current tree to produce an ordered,
//! conflict-free `MigrationPlan`.
//!
//! # Plan Shape
//!
//! | Section       | Contents | Executed |
//! |---------------|----------|----------|
//! | `create_dirs` | Layout directories + parents of every destination | First, by the scaffolder |
//! | `actions`     | Per-entry transfers, then whole-directory relocations | In order |
//! | `markers`     | Marker files that do not exist yet | After transfers |
//! | `removals`    | Source directories to drop if empty | Last |
//!
//! # Design
//!
//! - **Pure logic**: reads the tree through `DirectoryListing`, never mutates
//! - **Idempotent**: under `skip-if-exists` an occupied destination yields no
//!   action, and layout directories are never candidates, so planning an
//!   already migrated tree yields no transfers
//! - **Conflict-free**: no two actions share a destination

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::engine::classifier::{Classification, Classifier};
use crate::error::Result;
use crate::listing::DirectoryListing;
use crate::rules::{glob_parent, Matcher, RuleTable};
use crate::types::{ActionKind, ConflictPolicy, EntryKind};

/// Highest numeric suffix tried by `rename-on-conflict`.
pub const MAX_RENAME_ATTEMPTS: u32 = 999;

// ============================================================================
// Plan Types
// ============================================================================

/// A single planned transfer. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: ActionKind,
    pub policy: ConflictPolicy,
    /// Rule that produced this action
    pub rule_index: usize,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.kind,
            self.source.display(),
            self.destination.display()
        )
    }
}

/// A marker file to write once transfers are done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerWrite {
    pub path: PathBuf,
    pub contents: String,
}

/// The complete, ordered migration plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Directories to scaffold before any action runs, parents first
    pub create_dirs: Vec<PathBuf>,
    /// Ordered transfers
    pub actions: Vec<Action>,
    pub markers: Vec<MarkerWrite>,
    /// Directories to remove last, only if empty at that point
    pub removals: Vec<PathBuf>,
    /// Non-fatal issues found while planning
    pub warnings: Vec<String>,
}

impl MigrationPlan {
    /// Number of move/copy actions.
    pub fn transfer_count(&self) -> usize {
        self.actions.len()
    }

    /// True when executing the plan would change nothing except possibly
    /// scaffolding directories.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty() && self.markers.is_empty() && self.removals.is_empty()
    }

    /// Returns a summary of the plan for logging/display.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Migration Plan: {} transfer(s), {} marker(s), {} removal(s)",
            self.actions.len(),
            self.markers.len(),
            self.removals.len()
        )];
        for (i, action) in self.actions.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, action));
        }
        for marker in &self.markers {
            lines.push(format!("  + write {}", marker.path.display()));
        }
        for dir in &self.removals {
            lines.push(format!("  - remove {}/ if empty", dir.display()));
        }
        for warning in &self.warnings {
            lines.push(format!("  ! {}", warning));
        }
        lines.join("\n")
    }
}

// ============================================================================
// Plan Calculation
// ============================================================================

/// What a destination path will look like when its action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DestinationState {
    Vacant,
    Occupied,
    /// Another action of this plan writes to it (or inside it)
    Claimed,
    /// The scaffolder creates directories strictly inside it
    Scaffolded,
}

struct Candidate {
    path: PathBuf,
    kind: EntryKind,
}

/// Calculate the migration plan for the tree behind `listing`.
///
/// # Errors
///
/// - `RuleConflict`, `Config`, `Pattern`: the rule table is invalid
/// - `Io`: the project root itself cannot be listed
///
/// # What This Explicitly Refuses To Do
///
/// - Look below the top level, except inside the literal parent directory
///   of a glob rule
/// - Classify layout directories, their ancestors, or marker files
/// - Plan a self-move or a move of a directory into itself
/// - Plan two actions with the same destination
pub fn plan(listing: &dyn DirectoryListing, table: &RuleTable) -> Result<MigrationPlan> {
    let mut warnings = table.validate()?;
    for warning in &warnings {
        warn!("{}", warning);
    }

    let classifier = Classifier::new(table)?;
    let protected = table.protected_paths();
    let scaffold = scaffolded_paths(table);
    let candidates = collect_candidates(listing, table, &protected, &mut warnings)?;

    let mut entry_matches = Vec::new();
    let mut directory_matches = Vec::new();
    for candidate in &candidates {
        match classifier.classify(&candidate.path, candidate.kind) {
            Some(hit) if hit.whole_directory => directory_matches.push((candidate, hit)),
            Some(hit) => entry_matches.push((candidate, hit)),
            None => debug!(path = %candidate.path.display(), "No rule matches"),
        }
    }
    // Whole-directory relocations run last, in rule-table order.
    directory_matches.sort_by_key(|(_, hit)| hit.rule_index);

    let mut actions: Vec<Action> = Vec::new();
    for (candidate, hit) in entry_matches.into_iter().chain(directory_matches) {
        let planned = Planned {
            listing,
            scaffold: &scaffold,
            actions: &actions,
        };
        if let Some(action) = plan_transfer(&planned, candidate, hit, &mut warnings) {
            debug!(action = %action, "Planned");
            actions.push(action);
        }
    }

    let planned = Planned {
        listing,
        scaffold: &scaffold,
        actions: &actions,
    };
    let markers = plan_markers(&planned, table);
    let removals = plan_removals(listing, table, &protected, &actions);
    let create_dirs = plan_directories(table, &actions, &markers);

    info!(
        transfers = actions.len(),
        markers = markers.len(),
        removals = removals.len(),
        "Plan calculated"
    );

    Ok(MigrationPlan {
        create_dirs,
        actions,
        markers,
        removals,
        warnings,
    })
}

/// Top-level entries, then the children of every glob collection parent.
fn collect_candidates(
    listing: &dyn DirectoryListing,
    table: &RuleTable,
    protected: &BTreeSet<PathBuf>,
    warnings: &mut Vec<String>,
) -> Result<Vec<Candidate>> {
    let mut candidates: Vec<Candidate> = listing
        .children(Path::new(""))?
        .into_iter()
        .map(|entry| Candidate {
            path: PathBuf::from(entry.name),
            kind: entry.kind,
        })
        .collect();

    let mut parents: Vec<PathBuf> = Vec::new();
    for rule in &table.rules {
        if let Matcher::Glob { pattern } = &rule.matcher {
            if let Some(parent) = glob_parent(pattern) {
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
        }
    }

    for parent in parents {
        if listing.kind_of(&parent) != Some(EntryKind::Dir) {
            continue;
        }
        match listing.children(&parent) {
            Ok(children) => candidates.extend(children.into_iter().map(|entry| Candidate {
                path: parent.join(entry.name),
                kind: entry.kind,
            })),
            Err(e) => {
                let msg = format!("cannot list {}: {}", parent.display(), e);
                warn!("{}", msg);
                warnings.push(msg);
            }
        }
    }

    candidates.retain(|candidate| !protected.contains(&candidate.path));
    Ok(candidates)
}

/// Directories the scaffolder creates regardless of which actions run.
fn scaffolded_paths(table: &RuleTable) -> BTreeSet<PathBuf> {
    let marker_parents = table
        .markers
        .iter()
        .filter_map(|m| Path::new(&m.path).parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);
    table
        .directories
        .iter()
        .map(PathBuf::from)
        .chain(marker_parents)
        .collect()
}

/// The tree as it will look once earlier actions and the scaffolder ran.
struct Planned<'a> {
    listing: &'a dyn DirectoryListing,
    scaffold: &'a BTreeSet<PathBuf>,
    actions: &'a [Action],
}

impl Planned<'_> {
    /// Where `path` lives today when an earlier action relocates a
    /// directory that contains it.
    fn relocated_source(&self, path: &Path) -> Option<PathBuf> {
        self.actions.iter().find_map(|a| {
            path.strip_prefix(&a.destination)
                .ok()
                .map(|rest| a.source.join(rest))
        })
    }

    /// Project what `destination` will hold when its action runs.
    fn destination_state(&self, destination: &Path) -> DestinationState {
        if self
            .actions
            .iter()
            .any(|a| a.destination.starts_with(destination))
        {
            return DestinationState::Claimed;
        }
        if self
            .scaffold
            .iter()
            .any(|dir| dir != destination && dir.starts_with(destination))
        {
            return DestinationState::Scaffolded;
        }

        let projected = self.relocated_source(destination);
        let current = projected.as_deref().unwrap_or(destination);
        if self.listing.is_vacant(current) {
            DestinationState::Vacant
        } else {
            DestinationState::Occupied
        }
    }

    fn free_numbered_destination(&self, destination: &Path) -> Option<PathBuf> {
        (1..=MAX_RENAME_ATTEMPTS)
            .map(|n| numbered(destination, n))
            .find(|candidate| self.destination_state(candidate) == DestinationState::Vacant)
    }
}

fn plan_transfer(
    planned: &Planned<'_>,
    candidate: &Candidate,
    hit: Classification,
    warnings: &mut Vec<String>,
) -> Option<Action> {
    let source = &candidate.path;

    if hit.destination == *source {
        debug!(path = %source.display(), "Destination equals source, nothing to do");
        return None;
    }
    if hit.destination.starts_with(source) {
        let msg = format!(
            "rule #{} would move {} into itself ({}), ignored",
            hit.rule_index,
            source.display(),
            hit.destination.display()
        );
        warn!("{}", msg);
        warnings.push(msg);
        return None;
    }

    // A parent inside an earlier relocation must come along with it; the
    // scaffolder cannot create it without blocking that relocation.
    if let Some(parent) = hit.destination.parent() {
        if let Some(origin) = planned.relocated_source(parent) {
            if planned.listing.kind_of(&origin) != Some(EntryKind::Dir) {
                let msg = format!(
                    "{} would land in {}, which no earlier move provides, skipping",
                    source.display(),
                    parent.display()
                );
                warn!("{}", msg);
                warnings.push(msg);
                return None;
            }
        }
    }

    let state = planned.destination_state(&hit.destination);
    let destination = match (hit.policy, state) {
        (_, DestinationState::Vacant) => hit.destination,
        (
            ConflictPolicy::SkipIfExists | ConflictPolicy::Overwrite,
            DestinationState::Scaffolded,
        ) => {
            let msg = format!(
                "{} will hold layout directories, skipping {}",
                hit.destination.display(),
                source.display()
            );
            warn!("{}", msg);
            warnings.push(msg);
            return None;
        }
        (ConflictPolicy::SkipIfExists, _) => {
            debug!(
                source = %source.display(),
                destination = %hit.destination.display(),
                "Destination exists, treating as migrated"
            );
            return None;
        }
        (ConflictPolicy::Overwrite, DestinationState::Occupied) => hit.destination,
        (ConflictPolicy::Overwrite, DestinationState::Claimed) => {
            let msg = format!(
                "{} and an earlier action both target {}, skipping {}",
                source.display(),
                hit.destination.display(),
                source.display()
            );
            warn!("{}", msg);
            warnings.push(msg);
            return None;
        }
        (ConflictPolicy::RenameOnConflict, _) => {
            match planned.free_numbered_destination(&hit.destination) {
                Some(renamed) => renamed,
                None => {
                    let msg = format!(
                        "no free name for {} after {} attempts, skipping",
                        hit.destination.display(),
                        MAX_RENAME_ATTEMPTS
                    );
                    warn!("{}", msg);
                    warnings.push(msg);
                    return None;
                }
            }
        }
    };

    Some(Action {
        source: source.clone(),
        destination,
        kind: hit.action,
        policy: hit.policy,
        rule_index: hit.rule_index,
    })
}

/// `report.txt` → `report-2.txt`, `assets` → `assets-1`.
fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}-{}", stem, n),
    };
    path.with_file_name(name)
}

fn plan_markers(planned: &Planned<'_>, table: &RuleTable) -> Vec<MarkerWrite> {
    table
        .markers
        .iter()
        .filter(|marker| {
            planned.destination_state(Path::new(&marker.path)) == DestinationState::Vacant
        })
        .map(|marker| MarkerWrite {
            path: PathBuf::from(&marker.path),
            contents: marker.contents.clone(),
        })
        .collect()
}

fn plan_removals(
    listing: &dyn DirectoryListing,
    table: &RuleTable,
    protected: &BTreeSet<PathBuf>,
    actions: &[Action],
) -> Vec<PathBuf> {
    let mut wanted: Vec<PathBuf> = Vec::new();
    for rule in table.rules.iter().filter(|r| r.prune_source) {
        let dir = match &rule.matcher {
            Matcher::Glob { pattern } => glob_parent(pattern),
            Matcher::Directory { name } => Some(PathBuf::from(name)),
            _ => None,
        };
        wanted.extend(dir);
    }
    wanted.extend(table.cleanup.iter().map(PathBuf::from));

    let mut removals = Vec::new();
    for dir in wanted {
        let moved_away = actions
            .iter()
            .any(|a| a.kind == ActionKind::Move && a.source == dir);
        if moved_away
            || protected.contains(&dir)
            || removals.contains(&dir)
            || listing.kind_of(&dir) != Some(EntryKind::Dir)
        {
            continue;
        }
        removals.push(dir);
    }
    removals
}

fn plan_directories(
    table: &RuleTable,
    actions: &[Action],
    markers: &[MarkerWrite],
) -> Vec<PathBuf> {
    let mut dirs: BTreeSet<PathBuf> = table.directories.iter().map(PathBuf::from).collect();
    let parents = actions
        .iter()
        .map(|a| a.destination.as_path())
        .chain(markers.iter().map(|m| m.path.as_path()))
        .filter_map(Path::parent)
        .filter(|p| !p.as_os_str().is_empty());
    dirs.extend(parents.map(Path::to_path_buf));
    // Whatever sits strictly inside a relocated directory arrives with it.
    dirs.retain(|dir| {
        !actions
            .iter()
            .any(|a| dir != &a.destination && dir.starts_with(&a.destination))
    });
    // BTreeSet order puts every parent before its children.
    dirs.into_iter().collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReorgError;
    use crate::layout::default_rule_table;
    use crate::listing::MemoryListing;
    use crate::rules::Rule;

    fn names(list: &[&str]) -> Matcher {
        Matcher::Names {
            names: list.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn glob(pattern: &str) -> Matcher {
        Matcher::Glob {
            pattern: pattern.to_string(),
        }
    }

    fn table(rules: Vec<Rule>) -> RuleTable {
        RuleTable {
            rules,
            ..RuleTable::default()
        }
    }

    fn destinations(plan: &MigrationPlan) -> Vec<String> {
        plan.actions
            .iter()
            .map(|a| a.destination.display().to_string())
            .collect()
    }

    #[test]
    fn test_names_rule_plans_moves() {
        let tree = MemoryListing::from_paths(["settings.json", "auth.json", "README.md"]);
        let rules = table(vec![
            Rule::new(names(&["settings.json", "auth.json"]), "config")
                .with_policy(ConflictPolicy::Overwrite),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input

        assert_eq!(destinations(&plan), vec!["config/auth.json", "config/settings.json"]);
        assert!(plan.actions.iter().all(|a| a.kind == ActionKind::Move));
        assert_eq!(plan.create_dirs, vec![PathBuf::from("config")]);
    }

    #[test]
    fn test_skip_if_exists_omits_migrated_entries() {
        let tree = MemoryListing::from_paths(["loader.py", "src/utils/loader.py"]);
        let rules = table(vec![Rule::new(names(&["loader.py"]), "src/utils")]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn test_overwrite_plans_even_when_occupied() {
        let tree = MemoryListing::from_paths(["settings.json", "config/settings.json"]);
        let rules = table(vec![
            Rule::new(names(&["settings.json"]), "config").with_policy(ConflictPolicy::Overwrite),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert_eq!(destinations(&plan), vec!["config/settings.json"]);
    }

    #[test]
    fn test_rename_on_conflict_picks_free_suffix() {
        let tree = MemoryListing::from_paths([
            "notes.txt",
            "docs/notes.txt",
            "docs/notes-1.txt",
        ]);
        let rules = table(vec![
            Rule::new(names(&["notes.txt"]), "docs").with_policy(ConflictPolicy::RenameOnConflict),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert_eq!(destinations(&plan), vec!["docs/notes-2.txt"]);
    }

    #[test]
    fn test_db_glob_is_empty_after_migration() {
        // Databases already live under data/databases; nothing at the top level.
        let tree = MemoryListing::from_paths(["data/databases/cashout.db", "run.py"]);
        let rules = table(vec![Rule::new(glob("*.db"), "data/databases")]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn test_glob_collection_expands_per_file_and_prunes() {
        let tree = MemoryListing::from_paths([
            "icons/a.png",
            "icons/b.png",
            "assets/icons/b.png",
        ]);
        let rules = table(vec![Rule::new(glob("icons/*"), "assets/icons").pruning_source()]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input

        // b.png is already there; only a.png moves.
        assert_eq!(destinations(&plan), vec!["assets/icons/a.png"]);
        assert_eq!(plan.actions[0].source, PathBuf::from("icons/a.png"));
        assert_eq!(plan.removals, vec![PathBuf::from("icons")]);
    }

    #[test]
    fn test_directory_moves_come_after_entry_moves() {
        let tree = MemoryListing::from_paths(["ui/dark.css", "ui/form.py", "z.db"]);
        let rules = table(vec![
            Rule::new(
                Matcher::Directory {
                    name: "ui".to_string(),
                },
                "src/ui/legacy",
            ),
            Rule::new(glob("ui/*.css"), "assets/styles"),
            Rule::new(glob("*.db"), "data/databases"),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input

        assert_eq!(
            destinations(&plan),
            vec!["data/databases/z.db", "assets/styles/dark.css", "src/ui/legacy"]
        );
    }

    #[test]
    fn test_empty_placeholder_directory_is_vacant() {
        let tree = MemoryListing::from_paths(["DiamondChecker/check.py", "src/features/checker/"]);
        let rules = table(vec![Rule::new(
            Matcher::Directory {
                name: "DiamondChecker".to_string(),
            },
            "src/features/checker",
        )]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert_eq!(destinations(&plan), vec!["src/features/checker"]);
    }

    #[test]
    fn test_nested_relocation_checks_relocated_contents() {
        let tree =
            MemoryListing::from_paths(["modules/qframelesswindow/", "qframelesswindow/w.py"]);
        let rules = table(vec![
            Rule::new(
                Matcher::Directory {
                    name: "modules".to_string(),
                },
                "src/features/modules",
            ),
            Rule::new(
                Matcher::Directory {
                    name: "qframelesswindow".to_string(),
                },
                "src/features/modules/{name}",
            ),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input

        // modules/ brings an empty qframelesswindow/ placeholder along.
        assert_eq!(
            destinations(&plan),
            vec!["src/features/modules", "src/features/modules/qframelesswindow"]
        );
    }

    #[test]
    fn test_relocation_onto_scaffolded_parent_is_skipped() {
        let tree = MemoryListing::from_paths(["resources/logo.png"]);
        let rules = RuleTable {
            directories: vec!["assets/icons".to_string()],
            ..table(vec![Rule::new(
                Matcher::Directory {
                    name: "resources".to_string(),
                },
                "assets",
            )])
        };
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input

        // assets/ will not be empty once assets/icons is created.
        assert!(plan.actions.is_empty(), "{}", plan.summary());
        assert!(plan.warnings.iter().any(|w| w.contains("will hold layout directories")));
        assert!(plan.create_dirs.contains(&PathBuf::from("assets/icons")));
    }

    #[test]
    fn test_rename_avoids_scaffolded_parent() {
        let tree = MemoryListing::from_paths(["resources/logo.png"]);
        let rules = RuleTable {
            directories: vec!["assets/icons".to_string()],
            ..table(vec![Rule::new(
                Matcher::Directory {
                    name: "resources".to_string(),
                },
                "assets",
            )
            .with_policy(ConflictPolicy::RenameOnConflict)])
        };
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert_eq!(destinations(&plan), vec!["assets-1"]);
    }

    #[test]
    fn test_parents_inside_relocation_are_not_scaffolded() {
        let tree = MemoryListing::from_paths(["resources/img/", "icons/a.png"]);
        let rules = table(vec![
            Rule::new(
                Matcher::Directory {
                    name: "resources".to_string(),
                },
                "assets",
            ),
            Rule::new(
                Matcher::Directory {
                    name: "icons".to_string(),
                },
                "assets/img/{name}",
            ),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input

        assert_eq!(destinations(&plan), vec!["assets", "assets/img/icons"]);
        // resources/img/ arrives with the first move.
        assert!(!plan.create_dirs.contains(&PathBuf::from("assets/img")));
    }

    #[test]
    fn test_parent_missing_from_relocation_is_skipped() {
        let tree = MemoryListing::from_paths(["resources/x.png", "icons/a.png"]);
        let rules = table(vec![
            Rule::new(
                Matcher::Directory {
                    name: "resources".to_string(),
                },
                "assets",
            ),
            Rule::new(
                Matcher::Directory {
                    name: "icons".to_string(),
                },
                "assets/img/{name}",
            ),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input

        assert_eq!(destinations(&plan), vec!["assets"]);
        assert!(plan.warnings.iter().any(|w| w.contains("no earlier move provides")));
    }

    #[test]
    fn test_self_move_is_omitted() {
        let tree = MemoryListing::from_paths(["data/report.csv"]);
        let rules = table(vec![Rule::new(glob("data/*.csv"), "data")]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert!(plan.actions.is_empty());
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_move_into_itself_is_warned() {
        let tree = MemoryListing::from_paths(["assets/logo.png"]);
        let rules = table(vec![Rule::new(
            Matcher::Directory {
                name: "assets".to_string(),
            },
            "assets/legacy",
        )]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert!(plan.actions.is_empty());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_two_sources_never_share_a_destination() {
        let tree = MemoryListing::from_paths(["icons/logo.png", "images/logo.png"]);
        let rules = table(vec![
            Rule::new(glob("icons/*"), "assets"),
            Rule::new(glob("images/*"), "assets"),
        ]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].source, PathBuf::from("icons/logo.png"));
    }

    #[test]
    fn test_layout_directories_are_not_candidates() {
        let tree = MemoryListing::from_paths(["scripts/run.py", "run.py"]);
        let rules = RuleTable {
            directories: vec!["scripts".to_string()],
            rules: vec![Rule::new(glob("*"), "scripts")],
            ..RuleTable::default()
        };
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert_eq!(destinations(&plan), vec!["scripts/run.py"]);
    }

    #[test]
    fn test_conflicting_rules_fail_before_planning() {
        let tree = MemoryListing::from_paths(["loader.py"]);
        let rules = table(vec![
            Rule::new(names(&["loader.py"]), "src/utils"),
            Rule::new(names(&["loader.py"]), "scripts"),
        ]);
        let err = plan(&tree, &rules).expect_err("conflict must abort"); // test: expected error
        assert!(matches!(err, ReorgError::RuleConflict { .. }));
    }

    #[test]
    fn test_markers_skip_existing_and_claimed_paths() {
        let tree = MemoryListing::from_paths(["__init__.py", "config/__init__.py"]);
        let mut rules = table(vec![Rule::new(names(&["__init__.py"]), "src/utils")]);
        for path in ["src/utils/__init__.py", "config/__init__.py", "docs/__init__.py"] {
            rules.markers.push(crate::rules::Marker {
                path: path.to_string(),
                contents: String::new(),
            });
        }
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        let written: Vec<PathBuf> = plan.markers.iter().map(|m| m.path.clone()).collect();
        assert_eq!(written, vec![PathBuf::from("docs/__init__.py")]);
        assert!(plan.create_dirs.contains(&PathBuf::from("docs")));
    }

    #[test]
    fn test_cleanup_only_lists_existing_directories() {
        let tree = MemoryListing::from_paths(["ui_files/", "stale.txt"]);
        let mut rules = table(vec![]);
        rules.cleanup = vec![
            "ui_files".to_string(),
            "stale.txt".to_string(),
            "missing".to_string(),
        ];
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        assert_eq!(plan.removals, vec![PathBuf::from("ui_files")]);
    }

    #[test]
    fn test_default_layout_on_flat_project() {
        let tree = MemoryListing::from_paths([
            "DiamondSorter.py",
            "main.py",
            "settings.json",
            "cashout.db",
            "icons/app.ico",
            "ui/theme.css",
            "ui/layout.ui",
            "DiamondChecker/checker.py",
            "notes.md",
        ]);
        let plan = plan(&tree, &default_rule_table()).expect("plan generation failed"); // test: known-good input

        let dests = destinations(&plan);
        assert!(dests.contains(&"src/core/DiamondSorter.py".to_string()));
        assert!(dests.contains(&"src/core/app_main.py".to_string()));
        assert!(dests.contains(&"config/settings.json".to_string()));
        assert!(dests.contains(&"data/databases/cashout.db".to_string()));
        assert!(dests.contains(&"assets/icons/app.ico".to_string()));
        assert!(dests.contains(&"assets/styles/theme.css".to_string()));
        assert_eq!(dests.last().map(String::as_str), Some("src/features/checker"));
        assert!(!dests.iter().any(|d| d.contains("notes.md")));
        assert!(plan.removals.contains(&PathBuf::from("icons")));
        assert!(plan.removals.contains(&PathBuf::from("ui")));
    }

    #[test]
    fn test_numbered() {
        assert_eq!(numbered(Path::new("docs/a.txt"), 3), PathBuf::from("docs/a-3.txt"));
        assert_eq!(numbered(Path::new("assets"), 1), PathBuf::from("assets-1"));
    }

    #[test]
    fn test_summary_lists_actions() {
        let tree = MemoryListing::from_paths(["run.py"]);
        let rules = table(vec![Rule::new(names(&["run.py"]), "scripts")]);
        let plan = plan(&tree, &rules).expect("plan generation failed"); // test: known-good input
        let summary = plan.summary();
        assert!(summary.contains("1 transfer(s)"));
        assert!(summary.contains("move run.py -> scripts/run.py"));
        assert!(!plan.is_noop());
    }
}
