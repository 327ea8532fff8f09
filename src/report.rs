//! Structure Reporter
//!
//! Renders the resulting tree as an indented listing:
//!
//! ```text
//! project/
//!   main.py
//!   config/
//!     settings.json
//!   data/
//!     databases/
//!       a.db
//!       ... and 12 more files
//! ```
//!
//! Each directory lists its files first (at most `max_entries` of them),
//! then its subdirectories. Subdirectories are always shown and recursed
//! into until `max_depth`.

use std::io;
use std::path::Path;

use crate::listing::DirectoryListing;
use crate::types::EntryKind;

const INDENT: &str = "  ";

/// Reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Deepest directory level whose contents are listed (root is 0)
    pub max_depth: usize,
    /// Files shown per directory before truncation
    pub max_entries: usize,
    /// Entry names never shown (hidden entries are always skipped)
    pub ignore: Vec<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_entries: 10,
            ignore: vec!["__pycache__".to_string(), "target".to_string()],
        }
    }
}

impl ReportOptions {
    fn skips(&self, name: &str) -> bool {
        name.starts_with('.') || self.ignore.iter().any(|ignored| ignored == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DirNode {
    name: String,
    files: Vec<String>,
    hidden_files: usize,
    dirs: Vec<DirNode>,
}

/// A captured, render-ready view of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSnapshot {
    root: DirNode,
}

impl TreeSnapshot {
    /// Walk `listing` from its root.
    ///
    /// Unreadable subdirectories are shown without contents; only a failure
    /// to list the root itself is an error.
    pub fn capture(
        listing: &dyn DirectoryListing,
        root_label: &str,
        options: &ReportOptions,
    ) -> io::Result<Self> {
        let root = capture_dir(listing, Path::new(""), root_label, 0, options)?;
        Ok(Self { root })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        render_dir(&self.root, 0, &mut out);
        out
    }
}

fn capture_dir(
    listing: &dyn DirectoryListing,
    path: &Path,
    name: &str,
    depth: usize,
    options: &ReportOptions,
) -> io::Result<DirNode> {
    let mut node = DirNode {
        name: name.to_string(),
        files: Vec::new(),
        hidden_files: 0,
        dirs: Vec::new(),
    };
    if depth >= options.max_depth {
        return Ok(node);
    }

    // children() is sorted, so truncation always keeps the same names.
    for entry in listing.children(path)? {
        if options.skips(&entry.name) {
            continue;
        }
        match entry.kind {
            EntryKind::File if node.files.len() < options.max_entries => {
                node.files.push(entry.name)
            }
            EntryKind::File => node.hidden_files += 1,
            EntryKind::Dir => {
                let child_path = path.join(&entry.name);
                let child = capture_dir(listing, &child_path, &entry.name, depth + 1, options)
                    .unwrap_or_else(|e| {
                        tracing::debug!(
                            path = %child_path.display(),
                            error = %e,
                            "Unreadable directory"
                        );
                        DirNode {
                            name: entry.name.clone(),
                            files: Vec::new(),
                            hidden_files: 0,
                            dirs: Vec::new(),
                        }
                    });
                node.dirs.push(child);
            }
        }
    }
    Ok(node)
}

fn render_dir(node: &DirNode, level: usize, out: &mut String) {
    let indent = INDENT.repeat(level);
    let sub = INDENT.repeat(level + 1);

    out.push_str(&format!("{}{}/\n", indent, node.name));
    for file in &node.files {
        out.push_str(&format!("{}{}\n", sub, file));
    }
    if node.hidden_files > 0 {
        out.push_str(&format!("{}... and {} more files\n", sub, node.hidden_files));
    }
    for dir in &node.dirs {
        render_dir(dir, level + 1, out);
    }
}
