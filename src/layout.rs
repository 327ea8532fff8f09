//! Built-in target layout.
//!
//! The default rule table for a flat desktop-application project: entry
//! points go to `src/core`, views to `src/ui`, helpers to `src/utils`,
//! vendored packages to `src/features`, and loose resources into `assets`,
//! `config`, `data` and `scripts`.
//!
//! # Target Tree
//!
//! | Directory          | Receives |
//! |--------------------|----------|
//! | `src/core`         | Application entry points |
//! | `src/ui`           | Forms, tabs and dialogs |
//! | `src/utils`        | Helper modules |
//! | `src/features/*`   | Feature packages relocated as whole directories |
//! | `assets/*`         | Icons, images, stylesheets, bundled binaries |
//! | `config`           | Settings, license and build spec files |
//! | `data/databases`   | Every top-level `*.db` file |
//! | `scripts`          | Setup and maintenance scripts |
//!
//! Every rule moves. Settings files use `overwrite` because the copy at the
//! project root is always the newest one; everything else is
//! `skip-if-exists` so re-running is a no-op.

use crate::rules::{Marker, Matcher, Rule, RuleTable};
use crate::types::ConflictPolicy;

/// Directories of the target layout.
pub const LAYOUT_DIRECTORIES: &[&str] = &[
    "src/core",
    "src/ui",
    "src/utils",
    "src/data",
    "src/features/sorter",
    "src/features/checker",
    "src/features/browser",
    "src/features/chat",
    "src/features/modules",
    "src/features/references",
    "config",
    "assets/icons",
    "assets/images",
    "assets/styles",
    "assets/fonts",
    "docs",
    "tests",
    "scripts",
    "data/databases",
    "data/temp",
    "data/output",
    "logs",
];

/// Application entry points.
pub const CORE_FILES: &[&str] = &["DiamondSorter.py", "DiamondSorter.pyw"];

/// Forms, tabs and dialogs.
pub const UI_FILES: &[&str] = &[
    "forms.py",
    "ui_form.py",
    "form.ui",
    "general_tab.py",
    "about.py",
    "browser.py",
    "login_screen.py",
    "password_log_formats.py",
    "sorting_files_tab.py",
    "domain_sorter.py",
    "email_sorter.py",
    "url_tools.py",
    "url_tools1.py",
    "Ui_url_tools.py",
    "output.py",
    "disclaimer.py",
];

/// Helper modules.
pub const UTILITY_FILES: &[&str] = &[
    "__init__.py",
    "__main.py",
    "_diamondsorter.py",
    "cf.py",
    "authentication.py",
    "cryptolens_python2.py",
    "config_developer.py",
    "installer.py",
    "loader.py",
    "list_dependencies.py",
    "merged_example.py",
    "method1.py",
    "method2.py",
    "sdg.py",
    "test.py",
    "add_cookies_from_scan_to_db.py",
    "add_to_app.py",
];

/// Settings that are rewritten by the application and always win.
pub const SETTINGS_FILES: &[&str] = &["settings.json", "auth.json"];

/// Other configuration and legal files.
pub const CONFIG_FILES: &[&str] = &[
    "version.txt",
    "diamondsorter.spec",
    "EULA.rtf",
    "LICENSE",
    "r.txt",
];

/// Build, setup and maintenance scripts.
pub const SCRIPT_FILES: &[&str] = &[
    "cleanup.py",
    "dev_setup.py",
    "setup.py",
    "run.py",
    "Install Requirements.bat",
    "organize_project.py",
    "final_cleanup.py",
];

/// Loose resources kept next to the application.
pub const ASSET_FILES: &[&str] = &[
    "DIAMOND.ico",
    "favicon72x72.png",
    "qwindows.dll",
    "resources_rc.py",
    "THEME_README.md",
];

/// Whole directories and their new location. A `{name}` destination nests
/// the directory under its own name.
pub const DIRECTORY_MOVES: &[(&str, &str)] = &[
    ("DiamondChecker", "src/features/checker"),
    ("DiamondBrowser", "src/features/browser"),
    ("DiamondSorter_Chat", "src/features/chat"),
    ("modules", "src/features/modules"),
    ("references", "src/features/references"),
    ("qframelesswindow", "src/features/modules/{name}"),
    ("darkdetect", "src/features/modules/{name}"),
    ("other-examples", "src/features/{name}"),
    ("Created Resources", "data/{name}"),
    ("ui_files", "src/ui/{name}"),
    ("resources", "assets/{name}"),
];

/// Relocated directories to drop when a skipped move leaves them empty.
/// `icons`, `images` and `ui` are pruned by their glob rules; `data` is part
/// of the layout.
pub const CLEANUP_DIRECTORIES: &[&str] = &["ui_files", "other-examples", "Created Resources"];

/// Directories that get a package marker file.
pub const PACKAGE_DIRECTORIES: &[&str] = &[
    "src",
    "src/core",
    "src/ui",
    "src/utils",
    "src/data",
    "src/features",
    "src/features/sorter",
    "src/features/checker",
    "src/features/browser",
    "src/features/chat",
    "src/features/modules",
    "src/features/references",
    "config",
    "assets",
    "docs",
    "tests",
    "scripts",
];

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

/// Build the default rule table.
pub fn default_rule_table() -> RuleTable {
    let mut rules = vec![
        Rule::new(names(CORE_FILES), "src/core"),
        Rule::new(names(UI_FILES), "src/ui"),
        Rule::new(names(UTILITY_FILES), "src/utils"),
        Rule::new(names(SETTINGS_FILES), "config").with_policy(ConflictPolicy::Overwrite),
        Rule::new(names(CONFIG_FILES), "config"),
        Rule::new(names(SCRIPT_FILES), "scripts"),
        Rule::new(names(ASSET_FILES), "assets"),
        Rule::new(
            Matcher::Rename {
                from: "main.py".to_string(),
                to: "app_main.py".to_string(),
            },
            "src/core",
        ),
    ];

    rules.extend(DIRECTORY_MOVES.iter().map(|(name, destination)| {
        Rule::new(
            Matcher::Directory {
                name: name.to_string(),
            },
            *destination,
        )
    }));

    rules.push(Rule::new(glob("*.db"), "data/databases"));
    rules.push(Rule::new(glob("icons/*"), "assets/icons").pruning_source());
    rules.push(Rule::new(glob("images/*"), "assets/images").pruning_source());
    rules.push(Rule::new(glob("ui/*.css"), "assets/styles").pruning_source());

    RuleTable {
        directories: LAYOUT_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
        rules,
        markers: PACKAGE_DIRECTORIES
            .iter()
            .map(|dir| Marker {
                path: format!("{}/__init__.py", dir),
                contents: format!("# {} package\n", package_name(dir)),
            })
            .collect(),
        cleanup: CLEANUP_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
    }
}

fn package_name(dir: &str) -> &str {
    dir.rsplit('/').next().unwrap_or(dir)
}
