//! Directory Scaffolder
//!
//! Creates the target directory tree before any transfer runs. Creation is
//! idempotent; a non-directory occupying a required path is a fatal setup
//! error, so a run never starts moving data into a broken tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ReorgError, Result};

/// Ensure every directory in `dirs` (relative to `root`) exists.
///
/// Returns the directories that were actually created, in input order.
/// Missing ancestors are created as needed.
///
/// # Errors
///
/// `ReorgError::Setup` when a path (or one of its ancestors) exists but is
/// not a directory, or when creation fails for any other reason.
pub fn ensure_tree<P: AsRef<Path>>(root: &Path, dirs: &[P]) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    for dir in dirs {
        let relative = dir.as_ref();
        let target = root.join(relative);

        match fs::symlink_metadata(&target) {
            Ok(meta) if meta.is_dir() => {
                debug!(dir = %relative.display(), "Directory already present");
                continue;
            }
            Ok(_) => {
                return Err(ReorgError::setup(
                    relative,
                    "a non-directory entry occupies this path",
                ));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ReorgError::setup(relative, e.to_string())),
        }

        fs::create_dir_all(&target).map_err(|e| {
            let reason = match e.kind() {
                io::ErrorKind::AlreadyExists | io::ErrorKind::NotADirectory => {
                    "an ancestor of this path is not a directory".to_string()
                }
                _ => e.to_string(),
            };
            ReorgError::setup(relative, reason)
        })?;

        info!(dir = %relative.display(), "Created directory");
        created.push(relative.to_path_buf());
    }

    Ok(created)
}
