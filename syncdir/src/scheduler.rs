//! Breadth-first traversal over both trees
//!
//! The planner keeps a FIFO queue of relative paths seeded with the roots.
//! Each step compares one pair and queues the subdirectories both sides have,
//! so stack depth does not grow with tree depth.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::action::{Action, ActionSink, PlanSummary};
use crate::comparator::DirectoryComparator;
use crate::error::{PlanError, Result, Side};
use crate::progress::ProgressReporter;

/// Drives the comparator over every common directory of two trees
#[derive(Debug)]
pub struct Planner {
    left_root: PathBuf,
    right_root: PathBuf,
    pending: VecDeque<PathBuf>,
    comparator: DirectoryComparator,
    summary: PlanSummary,
}

impl Planner {
    /// Create a planner for two existing directories.
    ///
    /// Both roots are canonicalized, so every path in the plan is absolute.
    pub fn new(left: impl AsRef<Path>, right: impl AsRef<Path>) -> Result<Self> {
        let left_root = validate_root(Side::Left, left.as_ref())?;
        let right_root = validate_root(Side::Right, right.as_ref())?;

        Ok(Self {
            left_root,
            right_root,
            pending: VecDeque::from([PathBuf::new()]),
            comparator: DirectoryComparator::new(true),
            summary: PlanSummary::default(),
        })
    }

    pub fn left_root(&self) -> &Path {
        &self.left_root
    }

    pub fn right_root(&self) -> &Path {
        &self.right_root
    }

    /// Number of directory pairs waiting to be compared
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Counts of everything emitted so far
    pub fn summary(&self) -> &PlanSummary {
        &self.summary
    }

    /// Compare the next pending pair.
    ///
    /// Returns the relative path that was compared, or `None` once the queue
    /// is empty.
    pub fn step(&mut self, sink: &mut dyn ActionSink) -> Result<Option<PathBuf>> {
        let Some(relative) = self.pending.pop_front() else {
            return Ok(None);
        };

        let left_dir = resolve(&self.left_root, &relative);
        let right_dir = resolve(&self.right_root, &relative);
        debug!(
            left = %left_dir.display(),
            right = %right_dir.display(),
            pending = self.pending.len(),
            "comparing directory pair"
        );

        let mut tally = Tally {
            inner: sink,
            summary: &mut self.summary,
        };
        let common_dirs = self.comparator.compare(&left_dir, &right_dir, &mut tally)?;
        self.summary.pairs_compared += 1;

        self.pending
            .extend(common_dirs.into_iter().map(|name| relative.join(name)));

        Ok(Some(relative))
    }

    /// Compare every pair until the queue is empty
    pub fn run(
        mut self,
        sink: &mut dyn ActionSink,
        progress: &mut dyn ProgressReporter,
    ) -> Result<PlanSummary> {
        info!(
            left = %self.left_root.display(),
            right = %self.right_root.display(),
            "planning mirror"
        );

        let result = self.drive(sink, progress);
        match &result {
            Ok(summary) => {
                progress.finish(Some(&summary.to_string()));
                info!(commands = summary.total_commands(), "{}", summary);
            }
            Err(_) => progress.finish(None),
        }
        result
    }

    fn drive(
        &mut self,
        sink: &mut dyn ActionSink,
        progress: &mut dyn ProgressReporter,
    ) -> Result<PlanSummary> {
        let mut completed = 0;
        progress.update(completed, self.pending.len());

        while self.step(sink)?.is_some() {
            completed += 1;
            progress.update(completed, completed + self.pending.len());
        }

        sink.flush()?;
        Ok(self.summary.clone())
    }
}

/// Counts actions on their way to the real sink
struct Tally<'a, S: ActionSink + ?Sized> {
    inner: &'a mut S,
    summary: &'a mut PlanSummary,
}

impl<S: ActionSink + ?Sized> ActionSink for Tally<'_, S> {
    fn emit(&mut self, action: Action) -> Result<()> {
        self.summary.record(&action);
        self.inner.emit(action)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

fn resolve(root: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

fn validate_root(side: Side, path: &Path) -> Result<PathBuf> {
    let metadata =
        fs::metadata(path).map_err(|e| PlanError::invalid_root(side, path, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(PlanError::invalid_root(side, path, "not a directory"));
    }

    fs::canonicalize(path).map_err(|e| PlanError::invalid_root(side, path, e.to_string()))
}
