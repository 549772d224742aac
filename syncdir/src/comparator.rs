//! Comparison of one left/right directory pair
//!
//! Left entries are visited in the order the filesystem lists them and looked
//! up in a [`RightIndex`]. Each decision is handed to an [`ActionSink`]; right
//! entries nobody claimed are removed at the end when deletion is allowed.

use std::cmp::Ordering;
use std::ffi::OsString;
use std::path::Path;

use tracing::debug;

use crate::action::{Action, ActionSink, CopyReason, OverwriteReason, RemoveReason};
use crate::entry::{list_dir, Entry, EntryKind};
use crate::error::{PlanError, Result};
use crate::index::{MatchResult, RightIndex};

/// Compares directory pairs and plans how to make the right one match the left
#[derive(Debug, Clone, Copy)]
pub struct DirectoryComparator {
    allow_delete: bool,
}

impl Default for DirectoryComparator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DirectoryComparator {
    /// Create a comparator; without `allow_delete` a right entry that blocks a
    /// left entry of another kind aborts the run
    pub fn new(allow_delete: bool) -> Self {
        Self { allow_delete }
    }

    /// Compare one directory pair.
    ///
    /// Returns the names of subdirectories present as directories on both
    /// sides, in discovery order. An unreadable side is reported through the
    /// sink and yields no actions and no subdirectories.
    pub fn compare(
        &self,
        left_dir: &Path,
        right_dir: &Path,
        sink: &mut dyn ActionSink,
    ) -> Result<Vec<OsString>> {
        let left_entries = match list_dir(left_dir) {
            Ok(entries) => entries,
            Err(e) => return report_listing_failure(e, sink),
        };
        let right_entries = match list_dir(right_dir) {
            Ok(entries) => entries,
            Err(e) => return report_listing_failure(e, sink),
        };

        let mut index = RightIndex::new(right_entries);
        let mut common_dirs = Vec::new();

        for left in &left_entries {
            // Links are skipped before lookup, so a same-named right entry
            // stays unclaimed and is removed below
            if left.is_symlink() {
                sink.emit(Action::SkipSymlink {
                    path: left.path.clone(),
                })?;
                continue;
            }

            if let Some(name) = self.decide(index.match_left(left), right_dir, sink)? {
                common_dirs.push(name);
            }
        }

        if self.allow_delete {
            for extra in index.unprocessed() {
                self.decide(extra, right_dir, sink)?;
            }
        }

        Ok(common_dirs)
    }

    fn decide(
        &self,
        result: MatchResult<'_>,
        right_dir: &Path,
        sink: &mut dyn ActionSink,
    ) -> Result<Option<OsString>> {
        match result {
            MatchResult::UnmatchedLeft(left) => {
                copy_new(left, right_dir, sink)?;
                Ok(None)
            }
            MatchResult::Matched { left, right } => self.reconcile(left, right, right_dir, sink),
            MatchResult::UnmatchedRight(right) => {
                remove_extra(right, sink)?;
                Ok(None)
            }
        }
    }

    fn reconcile(
        &self,
        left: &Entry,
        right: &Entry,
        right_dir: &Path,
        sink: &mut dyn ActionSink,
    ) -> Result<Option<OsString>> {
        match (left.kind, right.kind) {
            (EntryKind::File, EntryKind::File) => {
                compare_files(left, right, right_dir, sink)?;
            }
            (EntryKind::File, EntryKind::Directory) => {
                self.remove_in_way(left, right, true, RemoveReason::DirBlocksFile, sink)?;
                sink.emit(copy(left, right_dir, false, CopyReason::FileReplacesDir))?;
            }
            (EntryKind::File, EntryKind::Symlink | EntryKind::Other) => {
                self.remove_in_way(left, right, false, RemoveReason::SpecialBlocksFile, sink)?;
                sink.emit(copy(left, right_dir, false, CopyReason::FileReplacesSpecial))?;
            }
            (EntryKind::Directory, EntryKind::Directory) => {
                return Ok(Some(left.name.clone()));
            }
            (EntryKind::Directory, _) => {
                self.remove_in_way(left, right, false, RemoveReason::EntryBlocksDir, sink)?;
                sink.emit(copy(left, right_dir, true, CopyReason::DirReplacesEntry))?;
            }
            // Special files; left links were skipped before lookup
            _ => {
                sink.emit(Action::SkipSpecial {
                    path: left.path.clone(),
                })?;
            }
        }
        Ok(None)
    }

    fn remove_in_way(
        &self,
        left: &Entry,
        right: &Entry,
        recursive: bool,
        reason: RemoveReason,
        sink: &mut dyn ActionSink,
    ) -> Result<()> {
        if !self.allow_delete {
            sink.emit(Action::CannotDelete {
                left: left.path.clone(),
                right: right.path.clone(),
            })?;
            return Err(PlanError::deletion_required(&left.path, &right.path));
        }

        sink.emit(Action::Remove {
            path: right.path.clone(),
            recursive,
            reason,
        })
    }
}

fn report_listing_failure(err: PlanError, sink: &mut dyn ActionSink) -> Result<Vec<OsString>> {
    match err {
        PlanError::Listing { path, source } => {
            debug!(path = %path.display(), error = %source, "skipping unreadable directory pair");
            sink.emit(Action::ListingFailed {
                path,
                message: source.to_string(),
            })?;
            Ok(Vec::new())
        }
        other => Err(other),
    }
}

fn copy(left: &Entry, right_dir: &Path, recursive: bool, reason: CopyReason) -> Action {
    Action::Copy {
        source: left.path.clone(),
        target_dir: right_dir.to_path_buf(),
        recursive,
        reason,
    }
}

fn copy_new(left: &Entry, right_dir: &Path, sink: &mut dyn ActionSink) -> Result<()> {
    let action = match left.kind {
        EntryKind::File => copy(left, right_dir, false, CopyReason::NewFile),
        EntryKind::Directory => copy(left, right_dir, true, CopyReason::NewDir),
        _ => Action::SkipOther {
            path: left.path.clone(),
        },
    };
    sink.emit(action)
}

fn compare_files(
    left: &Entry,
    right: &Entry,
    right_dir: &Path,
    sink: &mut dyn ActionSink,
) -> Result<()> {
    let same_size = left.size == right.size;
    let reason = match left.modified.cmp(&right.modified) {
        Ordering::Equal if same_size => return Ok(()),
        Ordering::Equal => OverwriteReason::SizeMismatch,
        Ordering::Less if same_size => OverwriteReason::TimestampNotPreserved,
        Ordering::Less => OverwriteReason::RightNewer,
        Ordering::Greater => OverwriteReason::LeftNewer,
    };

    debug!(
        left = %left.path.display(),
        right = %right.path.display(),
        left_size = left.size,
        right_size = right.size,
        anomaly = reason.is_anomaly(),
        "{}",
        reason.describe()
    );

    sink.emit(Action::Overwrite {
        source: left.path.clone(),
        target_dir: right_dir.to_path_buf(),
        reason,
        left: left.stamp(),
        right: right.stamp(),
    })
}

fn remove_extra(right: &Entry, sink: &mut dyn ActionSink) -> Result<()> {
    let (recursive, reason) = match right.kind {
        EntryKind::File => (false, RemoveReason::ExtraFile),
        EntryKind::Directory => (true, RemoveReason::ExtraDir),
        EntryKind::Symlink => (false, RemoveReason::ExtraSymlink),
        EntryKind::Other => (false, RemoveReason::ExtraSpecial),
    };
    sink.emit(Action::Remove {
        path: right.path.clone(),
        recursive,
        reason,
    })
}
