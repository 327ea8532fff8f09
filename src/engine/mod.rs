//! Engine modules: the reorganization pipeline.
//!
//! Classification and planning are pure and read the tree through a
//! `DirectoryListing`. Scaffolding and execution are the only stages that
//! touch the filesystem, and both run after the plan is complete.

pub mod classifier;
pub mod executor;
pub mod planner;
pub mod scaffold;
