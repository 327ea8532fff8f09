//! Directory listing providers.
//!
//! The planner and the reporter never call `std::fs` directly: they read the
//! current tree through `DirectoryListing`. `FsListing` is backed by a real
//! root directory; `MemoryListing` is a fixed in-memory tree used to plan
//! against fixtures without touching the disk.
//!
//! All paths handed to a listing are relative to its root. The empty path
//! (`Path::new("")`) is the root itself.

use crate::types::EntryKind;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Read-only view of a directory tree.
pub trait DirectoryListing {
    /// Kind of the entry at `path`, or `None` when nothing is there.
    fn kind_of(&self, path: &Path) -> Option<EntryKind>;

    /// Immediate children of `dir`, sorted by name.
    fn children(&self, dir: &Path) -> io::Result<Vec<ListedEntry>>;

    /// True when `path` is free to receive an entry: either absent or an
    /// empty directory (a scaffolded placeholder).
    fn is_vacant(&self, path: &Path) -> bool {
        match self.kind_of(path) {
            None => true,
            Some(EntryKind::File) => false,
            Some(EntryKind::Dir) => self
                .children(path)
                .map(|entries| entries.is_empty())
                .unwrap_or(false),
        }
    }
}

/// Listing backed by the filesystem under `root`.
#[derive(Debug, Clone)]
pub struct FsListing {
    root: PathBuf,
}

impl FsListing {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DirectoryListing for FsListing {
    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        // Symlinks are reported as files so they are relocated, never followed.
        let meta = fs::symlink_metadata(self.root.join(path)).ok()?;
        if meta.is_dir() {
            Some(EntryKind::Dir)
        } else {
            Some(EntryKind::File)
        }
    }

    fn children(&self, dir: &Path) -> io::Result<Vec<ListedEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(dir = %dir.display(), name = ?raw, "Skipping non UTF-8 entry");
                    continue;
                }
            };
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(ListedEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Fixed in-memory tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryListing {
    entries: BTreeMap<PathBuf, EntryKind>,
}

impl MemoryListing {
    /// Build a tree from relative paths. A trailing `/` marks a directory;
    /// missing ancestors are added as directories.
    ///
    /// ```
    /// use reorg::listing::{DirectoryListing, MemoryListing};
    /// use std::path::Path;
    ///
    /// let tree = MemoryListing::from_paths(["main.py", "icons/", "ui/dark.css"]);
    /// assert!(tree.kind_of(Path::new("ui")).is_some());
    /// assert!(tree.is_vacant(Path::new("icons")));
    /// ```
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut listing = Self::default();
        for raw in paths {
            let raw = raw.as_ref();
            let kind = if raw.ends_with('/') {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            listing.insert(Path::new(raw.trim_end_matches('/')), kind);
        }
        listing
    }

    /// Add an entry and any missing ancestor directories.
    pub fn insert(&mut self, path: &Path, kind: EntryKind) {
        let mut ancestor = path.parent();
        while let Some(dir) = ancestor {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.entries.entry(dir.to_path_buf()).or_insert(EntryKind::Dir);
            ancestor = dir.parent();
        }
        self.entries.insert(path.to_path_buf(), kind);
    }
}

impl DirectoryListing for MemoryListing {
    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        if path.as_os_str().is_empty() {
            return Some(EntryKind::Dir);
        }
        self.entries.get(path).copied()
    }

    fn children(&self, dir: &Path) -> io::Result<Vec<ListedEntry>> {
        match self.kind_of(dir) {
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} does not exist", dir.display()),
                ));
            }
            Some(EntryKind::File) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", dir.display()),
                ));
            }
            Some(EntryKind::Dir) => {}
        }

        // BTreeMap order keeps the result sorted by name.
        Ok(self
            .entries
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, kind)| {
                let name = path.file_name()?.to_str()?.to_string();
                Some(ListedEntry { name, kind: *kind })
            })
            .collect())
    }
}
