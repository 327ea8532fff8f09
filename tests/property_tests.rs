//! Property-Based Tests for reorg
//!
//! These tests verify:
//! - Planning invariants (unique destinations, protected paths untouched)
//! - Idempotence of a real run against the built-in layout
//! - Determinism of plans and structure reports

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;

use reorg::layout::{CONFIG_FILES, CORE_FILES, SCRIPT_FILES, UI_FILES, UTILITY_FILES};
use reorg::{
    default_rule_table, plan, MemoryListing, ReorgError, Reorganizer, ReportOptions, TreeSnapshot,
};

// =============================================================================
// Strategies
// =============================================================================

/// File names the built-in layout knows about.
fn known_name() -> impl Strategy<Value = String> {
    let names: Vec<&'static str> = CORE_FILES
        .iter()
        .chain(UI_FILES)
        .chain(UTILITY_FILES)
        .chain(CONFIG_FILES)
        .chain(SCRIPT_FILES)
        .copied()
        .collect();
    proptest::sample::select(names).prop_map(str::to_string)
}

/// Arbitrary relative path of one to three components.
fn any_path() -> impl Strategy<Value = String> {
    prop_oneof![
        known_name(),
        "[a-z]{1,6}\\.(db|png|css|txt)",
        "(icons|images|ui|data|src|config)/[a-z]{1,6}\\.(png|css|db)",
        "(modules|DiamondChecker|assets)/[a-z]{1,4}/[a-z]{1,4}\\.py",
    ]
}

fn project_paths() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set(any_path(), 0..24)
}

// =============================================================================
// Planner Properties
// =============================================================================

proptest! {
    /// No two actions ever share a destination
    #[test]
    fn destinations_are_unique(paths in project_paths()) {
        let tree = MemoryListing::from_paths(&paths);
        let plan = plan(&tree, &default_rule_table()).expect("default table is valid");

        let mut seen = BTreeSet::new();
        for action in &plan.actions {
            prop_assert!(seen.insert(action.destination.clone()), "duplicate {}", action);
        }
    }

    /// Layout directories, their ancestors and markers are never sources
    #[test]
    fn protected_paths_are_never_moved(paths in project_paths()) {
        let table = default_rule_table();
        let protected = table.protected_paths();
        let tree = MemoryListing::from_paths(&paths);
        let plan = plan(&tree, &table).expect("default table is valid");

        for action in &plan.actions {
            prop_assert!(!protected.contains(&action.source), "moved {}", action);
        }
    }

    /// Planning the same tree twice gives the same plan
    #[test]
    fn planning_is_deterministic(paths in project_paths()) {
        let tree = MemoryListing::from_paths(&paths);
        let first = plan(&tree, &default_rule_table()).expect("default table is valid");
        let second = plan(&tree, &default_rule_table()).expect("default table is valid");
        prop_assert_eq!(first, second);
    }

    /// Every directory to create is listed after its parent
    #[test]
    fn create_dirs_are_parent_first(paths in project_paths()) {
        let tree = MemoryListing::from_paths(&paths);
        let plan = plan(&tree, &default_rule_table()).expect("default table is valid");

        for (i, dir) in plan.create_dirs.iter().enumerate() {
            for later in &plan.create_dirs[i + 1..] {
                prop_assert!(!dir.starts_with(later), "{:?} before {:?}", dir, later);
            }
        }
    }
}

// =============================================================================
// Reporter Properties
// =============================================================================

proptest! {
    /// Rendering an unchanged tree is deterministic
    #[test]
    fn render_is_deterministic(paths in project_paths(), cap in 1usize..4) {
        let tree = MemoryListing::from_paths(&paths);
        let options = ReportOptions { max_entries: cap, ..ReportOptions::default() };

        let first = TreeSnapshot::capture(&tree, "project", &options).expect("capture").render();
        let second = TreeSnapshot::capture(&tree, "project", &options).expect("capture").render();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.starts_with("project/\n"));
    }
}

// =============================================================================
// Filesystem Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// A second run over a migrated tree changes nothing
    #[test]
    fn second_run_is_noop(paths in project_paths()) {
        let temp = tempfile::tempdir().expect("tempdir");
        for path in &paths {
            let full = temp.path().join(path);
            if let Some(parent) = full.parent() {
                // A generated file may already occupy a generated parent.
                if fs::create_dir_all(parent).is_err() {
                    continue;
                }
            }
            let _ = fs::write(&full, path.as_bytes());
        }

        let reorganizer = Reorganizer::new(temp.path(), default_rule_table());
        let first = match reorganizer.run() {
            Ok(report) => report,
            // A generated file sitting on a layout path is a setup error.
            Err(e) => {
                prop_assert!(matches!(e, ReorgError::Setup { .. }), "{}", e);
                return Ok(());
            }
        };
        prop_assert!(!first.summary.has_failures(), "{}", first.summary);

        let second = reorganizer.plan().expect("migrated tree plans");
        prop_assert_eq!(second.transfer_count(), 0, "{}", second.summary());
        prop_assert!(second.markers.is_empty(), "{}", second.summary());
    }
}
