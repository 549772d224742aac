//! Directory mirror planner
//!
//! Compares a left and a right directory tree and plans, without running
//! them, the shell commands that make the right tree a mirror of the left:
//! - Entries are matched by name, one directory pair at a time
//! - Files are identical when size and modification time agree
//! - Symbolic links on the left are never mirrored
//! - Directory pairs are visited breadth-first from an explicit queue

pub mod action;
pub mod comparator;
pub mod entry;
pub mod error;
pub mod index;
pub mod progress;
mod raw_path;
pub mod scheduler;

// Re-export main types and functions
pub use action::{
    Action, ActionSink, CopyReason, JsonLinesWriter, OverwriteReason, PlanSummary, RemoveReason,
    ShellScriptWriter,
};
pub use comparator::DirectoryComparator;
pub use entry::{list_dir, Entry, EntryKind, Stamp};
pub use error::{PlanError, Result, Side};
pub use index::{MatchResult, RightIndex};
pub use progress::{ConsoleProgress, NoProgress, ProgressReporter};
pub use scheduler::Planner;

/// Plan the mirror of `left` onto `right`, sending every action to `sink`
pub fn plan(
    left: impl AsRef<std::path::Path>,
    right: impl AsRef<std::path::Path>,
    sink: &mut dyn ActionSink,
) -> Result<PlanSummary> {
    let planner = Planner::new(left, right)?;
    planner.run(sink, &mut NoProgress)
}

// Test modules
#[cfg(test)]
mod test_support;
