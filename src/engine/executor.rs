//! Migration Executor
//!
//! Applies a `MigrationPlan` to the filesystem, one step at a time, and
//! records an `Outcome` per step. Problems with a single step are outcome
//! statuses, never errors: a failed move does not stop the next one.
//!
//! Order of execution: transfers, then marker files, then removals.
//!
//! Every step is committed on its own, so an interrupted run leaves each
//! entry either at its source or at its destination.

use std::fmt;
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use strum::Display;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::engine::planner::{Action, MarkerWrite, MigrationPlan};
use crate::types::{ActionKind, ConflictPolicy};

/// One unit of work taken from a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Transfer(Action),
    WriteMarker(MarkerWrite),
    RemoveDir(PathBuf),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer(action) => write!(f, "{}", action),
            Self::WriteMarker(marker) => write!(f, "write {}", marker.path.display()),
            Self::RemoveDir(dir) => write!(f, "remove {}/", dir.display()),
        }
    }
}

/// Why a step did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SkipReason {
    SourceMissing,
    DestinationExists,
    NotEmpty,
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Applied,
    Skipped(SkipReason),
    Failed(String),
}

impl Status {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Skipped(reason) => write!(f, "skipped: {}", reason),
            Self::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub step: Step,
    pub status: Status,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.step)
    }
}

/// Counts of a finished run plus every failure line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match &outcome.status {
                Status::Applied => summary.applied += 1,
                Status::Skipped(_) => summary.skipped += 1,
                Status::Failed(error) => {
                    summary.failed += 1;
                    summary.failures.push(format!("{}: {}", outcome.step, error));
                }
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} skipped, {} failed",
            self.applied, self.skipped, self.failed
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}", failure)?;
        }
        Ok(())
    }
}

/// Applies plans below a project root.
pub struct Executor {
    root: PathBuf,
}

impl Executor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Run every step of `plan` in order.
    ///
    /// Directories in `plan.create_dirs` must already exist; see
    /// `engine::scaffold::ensure_tree`.
    pub fn execute(&self, plan: &MigrationPlan) -> Vec<Outcome> {
        let steps = plan
            .actions
            .iter()
            .cloned()
            .map(Step::Transfer)
            .chain(plan.markers.iter().cloned().map(Step::WriteMarker))
            .chain(plan.removals.iter().cloned().map(Step::RemoveDir));

        let mut outcomes = Vec::new();
        for step in steps {
            let status = match &step {
                Step::Transfer(action) => self.transfer(action),
                Step::WriteMarker(marker) => self.write_marker(marker),
                Step::RemoveDir(dir) => self.remove_dir(dir),
            };
            match &status {
                Status::Applied => info!(step = %step, "Applied"),
                Status::Skipped(reason) => debug!(step = %step, reason = %reason, "Skipped"),
                Status::Failed(error) => warn!(step = %step, error = %error, "Failed"),
            }
            outcomes.push(Outcome { step, status });
        }
        outcomes
    }

    fn transfer(&self, action: &Action) -> Status {
        let source = self.root.join(&action.source);
        let destination = self.root.join(&action.destination);

        match fs::symlink_metadata(&source) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Status::Skipped(SkipReason::SourceMissing);
            }
            Err(e) => return Status::Failed(e.to_string()),
        }

        if let Err(status) = clear_destination(&destination, action.policy) {
            return status;
        }

        let result = match action.kind {
            ActionKind::Move => move_entry(&source, &destination),
            ActionKind::Copy => copy_entry(&source, &destination),
        };

        match result {
            Ok(()) => Status::Applied,
            Err(e) => Status::Failed(e.to_string()),
        }
    }

    fn write_marker(&self, marker: &MarkerWrite) -> Status {
        let path = self.root.join(&marker.path);
        // create_new: never touch a marker someone else wrote meanwhile.
        let result = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| io::Write::write_all(&mut file, marker.contents.as_bytes()));

        match result {
            Ok(()) => Status::Applied,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Status::Skipped(SkipReason::DestinationExists)
            }
            Err(e) => Status::Failed(e.to_string()),
        }
    }

    fn remove_dir(&self, dir: &Path) -> Status {
        let path = self.root.join(dir);
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Status::Skipped(SkipReason::SourceMissing),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Status::Skipped(SkipReason::SourceMissing);
            }
            Err(e) => return Status::Failed(e.to_string()),
        }

        match is_empty_dir(&path) {
            Ok(true) => match fs::remove_dir(&path) {
                Ok(()) => Status::Applied,
                Err(e) => Status::Failed(e.to_string()),
            },
            Ok(false) => Status::Skipped(SkipReason::NotEmpty),
            Err(e) => Status::Failed(e.to_string()),
        }
    }
}

/// Make `destination` vacant according to `policy`, or return the status
/// the step ends with.
///
/// An empty directory is a scaffolded placeholder and is always replaced.
/// A non-empty directory is never deleted, even under `overwrite`.
fn clear_destination(destination: &Path, policy: ConflictPolicy) -> Result<(), Status> {
    let meta = match fs::symlink_metadata(destination) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Status::Failed(e.to_string())),
    };

    if meta.is_dir() {
        return match is_empty_dir(destination) {
            Ok(true) => fs::remove_dir(destination).map_err(|e| Status::Failed(e.to_string())),
            Ok(false) if policy == ConflictPolicy::Overwrite => Err(Status::Failed(
                "destination is a non-empty directory".to_string(),
            )),
            Ok(false) => Err(Status::Skipped(SkipReason::DestinationExists)),
            Err(e) => Err(Status::Failed(e.to_string())),
        };
    }

    match policy {
        ConflictPolicy::Overwrite => {
            debug!(path = %destination.display(), "Removing occupant");
            fs::remove_file(destination).map_err(|e| Status::Failed(e.to_string()))
        }
        ConflictPolicy::SkipIfExists | ConflictPolicy::RenameOnConflict => {
            Err(Status::Skipped(SkipReason::DestinationExists))
        }
    }
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Rename, falling back to copy-then-remove across filesystems.
fn move_entry(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!(
                src = %source.display(),
                dest = %destination.display(),
                "Rename crosses filesystems, falling back to copy+remove"
            );
            copy_entry(source, destination)?;
            if fs::symlink_metadata(source)?.is_dir() {
                fs::remove_dir_all(source)
            } else {
                fs::remove_file(source)
            }
        }
        Err(e) => Err(e),
    }
}

/// Duplicate a file, symlink or directory tree. Symlinks are recreated,
/// never followed. On failure nothing is left at `destination`.
fn copy_entry(source: &Path, destination: &Path) -> io::Result<()> {
    let result = if fs::symlink_metadata(source)?.is_dir() {
        copy_dir(source, destination)
    } else {
        copy_leaf(source, destination)
    };

    if result.is_err() {
        discard_partial(destination);
    }
    result
}

fn discard_partial(path: &Path) {
    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    if let Err(e) = removed {
        warn!(path = %path.display(), error = %e, "Could not remove partial copy");
    }
}

fn copy_leaf(source: &Path, destination: &Path) -> io::Result<()> {
    if fs::symlink_metadata(source)?.file_type().is_symlink() {
        copy_symlink(source, destination)
    } else {
        copy_file(source, destination)
    }
}

#[cfg(unix)]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(source)?, destination)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, _destination: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot recreate symlink {}", source.display()),
    ))
}

/// Copy one regular file, keeping its access and modification times.
///
/// `fs::copy` also copies the permission bits, so the times are set through
/// a read-only handle: a 0444 copy cannot be opened for writing.
fn copy_file(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    let meta = fs::metadata(source)?;
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    File::open(destination)?.set_times(times)
}

fn copy_dir(source: &Path, destination: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_leaf(entry.path(), &target)?;
        }
    }
    Ok(())
}
