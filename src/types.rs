//! Type-safe rule vocabulary for reorg
//!
//! Action kinds and conflict policies are enums rather than strings so that a
//! typo in a rule file fails at load time instead of silently doing nothing.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// What a matched rule does with its source entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ActionKind {
    /// Relocate; the source no longer exists afterwards
    #[default]
    Move,
    /// Duplicate with timestamps preserved; the source stays in place
    Copy,
}

/// Behavior when the destination path is already occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Leave the source alone; treated as already migrated
    #[default]
    SkipIfExists,
    /// Replace whatever is at the destination (last write wins)
    Overwrite,
    /// Pick a free `name-N.ext` destination instead
    RenameOnConflict,
}

/// Kind of an entry in a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        self == Self::Dir
    }
}
