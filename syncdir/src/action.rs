//! Planned actions and the sinks that render them
//!
//! An [`Action`] is one decision of the comparator. [`Action::write_shell`]
//! renders the shell text an operator reviews and runs: paths in single quotes and a
//! trailing `# rationale` comment. Anomalous decisions are preceded by a
//! `# WARNING:` line. Paths are written byte for byte and a single quote
//! inside a path is not escaped.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entry::Stamp;
use crate::error::Result;
use crate::raw_path;

/// Why a left entry is copied into the right directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyReason {
    NewFile,
    NewDir,
    /// A right directory of the same name was removed first
    FileReplacesDir,
    /// A right special file or symbolic link of the same name was removed first
    FileReplacesSpecial,
    /// A right non-directory of the same name was removed first
    DirReplacesEntry,
}

impl CopyReason {
    pub fn describe(&self) -> &'static str {
        match self {
            CopyReason::NewFile => "copy a new file",
            CopyReason::NewDir => "copy a new dir",
            CopyReason::FileReplacesDir => "copy a file in place of a dir",
            CopyReason::FileReplacesSpecial => "copy a file in place of a special file",
            CopyReason::DirReplacesEntry => "copy a dir in place of a file",
        }
    }
}

/// Why a right file is overwritten by the left file of the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteReason {
    /// Left is newer
    LeftNewer,
    /// Right is newer but the sizes agree: an earlier copy lost its timestamp
    TimestampNotPreserved,
    /// Same timestamp, different size
    SizeMismatch,
    /// Right is newer and the sizes differ
    RightNewer,
}

impl OverwriteReason {
    pub fn describe(&self) -> &'static str {
        match self {
            OverwriteReason::LeftNewer => "overwrite an older file",
            OverwriteReason::TimestampNotPreserved => "overwrite a file whose timestamp was not preserved",
            OverwriteReason::SizeMismatch => "overwrite a file with the same timestamp",
            OverwriteReason::RightNewer => "overwrite a newer file",
        }
    }

    /// Anomalies are resolved but flagged for review
    pub fn is_anomaly(&self) -> bool {
        matches!(self, OverwriteReason::SizeMismatch | OverwriteReason::RightNewer)
    }
}

/// Why a right entry is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveReason {
    ExtraFile,
    ExtraDir,
    ExtraSymlink,
    ExtraSpecial,
    /// A right directory has the name of a left file
    DirBlocksFile,
    /// A right special file or symbolic link has the name of a left file
    SpecialBlocksFile,
    /// A right non-directory has the name of a left directory
    EntryBlocksDir,
}

impl RemoveReason {
    pub fn describe(&self) -> &'static str {
        match self {
            RemoveReason::ExtraFile => "remove extra file in right",
            RemoveReason::ExtraDir => "remove extra dir in right",
            RemoveReason::ExtraSymlink => "remove extra symbol link in right",
            RemoveReason::ExtraSpecial => "remove extra special file in right",
            RemoveReason::DirBlocksFile => "remove dir in right to make room for a file",
            RemoveReason::SpecialBlocksFile => "remove special file in right to make room for a file",
            RemoveReason::EntryBlocksDir => "remove file in right to make room for a dir",
        }
    }

    pub fn removes_special(&self) -> bool {
        matches!(self, RemoveReason::ExtraSpecial | RemoveReason::SpecialBlocksFile)
    }
}

/// One line (or warning plus line) of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Copy `source` into `target_dir`, preserving timestamps
    Copy {
        #[serde(with = "raw_path")]
        source: PathBuf,
        #[serde(with = "raw_path")]
        target_dir: PathBuf,
        recursive: bool,
        reason: CopyReason,
    },
    /// Force-copy `source` over the same-named file in `target_dir`
    Overwrite {
        #[serde(with = "raw_path")]
        source: PathBuf,
        #[serde(with = "raw_path")]
        target_dir: PathBuf,
        reason: OverwriteReason,
        left: Stamp,
        right: Stamp,
    },
    /// Remove `path` without following it if it is a symbolic link
    Remove {
        #[serde(with = "raw_path")]
        path: PathBuf,
        recursive: bool,
        reason: RemoveReason,
    },
    /// A left symbolic link, never mirrored
    SkipSymlink {
        #[serde(with = "raw_path")]
        path: PathBuf,
    },
    /// A left special file with no right counterpart
    SkipOther {
        #[serde(with = "raw_path")]
        path: PathBuf,
    },
    /// A left special file whose name also exists on the right
    SkipSpecial {
        #[serde(with = "raw_path")]
        path: PathBuf,
    },
    /// A directory pair that could not be listed; nothing beneath it is planned
    ListingFailed {
        #[serde(with = "raw_path")]
        path: PathBuf,
        message: String,
    },
    /// A right entry is in the way and removing it is not permitted
    CannotDelete {
        #[serde(with = "raw_path")]
        left: PathBuf,
        #[serde(with = "raw_path")]
        right: PathBuf,
    },
}

impl Action {
    /// Whether running this line changes the right tree
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Action::Copy { .. } | Action::Overwrite { .. } | Action::Remove { .. }
        )
    }

    /// Whether this action carries a `# WARNING:` line
    pub fn is_warning(&self) -> bool {
        match self {
            Action::Overwrite { reason, .. } => reason.is_anomaly(),
            Action::Remove { reason, .. } => reason.removes_special(),
            Action::SkipOther { .. } | Action::SkipSpecial { .. } => true,
            _ => false,
        }
    }

    /// Write the shell text of this action, without a trailing newline.
    ///
    /// Paths are written byte for byte, so names that are not valid UTF-8
    /// still address the real entry.
    pub fn write_shell<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        match self {
            Action::Copy {
                source,
                target_dir,
                recursive,
                reason,
            } => {
                let flag = if *recursive { " -R" } else { "" };
                write!(out, "cp --preserve=timestamps{} ", flag)?;
                write_quoted(out, source)?;
                out.write_all(b" ")?;
                write_quoted(out, target_dir)?;
                write!(out, " # {}", reason.describe())
            }
            Action::Overwrite {
                source,
                target_dir,
                reason,
                left,
                right,
            } => {
                match reason {
                    OverwriteReason::SizeMismatch => {
                        out.write_all(
                            b"# WARNING: found two files with same timestamp but in diff size: ",
                        )?;
                        write_quoted(out, source)?;
                        writeln!(
                            out,
                            " ({} bytes vs {} bytes, modified {})",
                            left.size,
                            right.size,
                            left.modified.to_rfc3339()
                        )?;
                    }
                    OverwriteReason::RightNewer => {
                        out.write_all(b"# WARNING: overwrite a newer file: ")?;
                        write_quoted(out, source)?;
                        writeln!(
                            out,
                            " (left modified {}, right modified {})",
                            left.modified.to_rfc3339(),
                            right.modified.to_rfc3339()
                        )?;
                    }
                    OverwriteReason::LeftNewer | OverwriteReason::TimestampNotPreserved => {}
                }
                // /bin/cp sidesteps an interactive `cp -i` alias
                out.write_all(b"/bin/cp --preserve=timestamps -f ")?;
                write_quoted(out, source)?;
                out.write_all(b" ")?;
                write_quoted(out, target_dir)?;
                write!(out, " # {}", reason.describe())
            }
            Action::Remove {
                path,
                recursive,
                reason,
            } => {
                if reason.removes_special() {
                    out.write_all(b"# WARNING: remove a special file in right dir: ")?;
                    write_quoted(out, path)?;
                    out.write_all(b"\n")?;
                }
                let flags = if *recursive { "-Rf" } else { "-f" };
                write!(out, "rm {} ", flags)?;
                write_quoted(out, path)?;
                write!(out, " # {}", reason.describe())
            }
            Action::SkipSymlink { path } => {
                out.write_all(b"# Skip symbol link: ")?;
                write_quoted(out, path)
            }
            Action::SkipOther { path } => {
                out.write_all(b"# WARNING: Skip other file: ")?;
                write_quoted(out, path)
            }
            Action::SkipSpecial { path } => {
                out.write_all(b"# WARNING: Skip special file: ")?;
                write_quoted(out, path)
            }
            Action::ListingFailed { path, message } => {
                out.write_all(b"# ERROR: cannot list ")?;
                write_quoted(out, path)?;
                write!(out, ": {}", message)
            }
            Action::CannotDelete { left, right } => {
                out.write_all(b"# ERROR: can not remove ")?;
                write_quoted(out, right)?;
                out.write_all(b" in right to make room for ")?;
                write_quoted(out, left)
            }
        }
    }
}

fn write_quoted<W: Write + ?Sized>(out: &mut W, path: &Path) -> io::Result<()> {
    out.write_all(b"'")?;
    out.write_all(&raw_path::as_bytes(path))?;
    out.write_all(b"'")
}

/// Shell text with any non-UTF-8 bytes replaced, for logs and messages
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = Vec::new();
        self.write_shell(&mut text).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&text))
    }
}

/// Receiver of planned actions, in plan order
pub trait ActionSink {
    fn emit(&mut self, action: Action) -> Result<()>;

    /// Push buffered output to its destination
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ActionSink for Vec<Action> {
    fn emit(&mut self, action: Action) -> Result<()> {
        self.push(action);
        Ok(())
    }
}

impl<S: ActionSink + ?Sized> ActionSink for &mut S {
    fn emit(&mut self, action: Action) -> Result<()> {
        (**self).emit(action)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Writes each action as shell text, one command per line
pub struct ShellScriptWriter<W: Write> {
    out: W,
}

impl<W: Write> ShellScriptWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ActionSink for ShellScriptWriter<W> {
    fn emit(&mut self, action: Action) -> Result<()> {
        action.write_shell(&mut self.out)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Writes each action as one JSON object per line
pub struct JsonLinesWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ActionSink for JsonLinesWriter<W> {
    fn emit(&mut self, action: Action) -> Result<()> {
        serde_json::to_writer(&mut self.out, &action)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Counts of what a plan contains
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub pairs_compared: usize,
    pub listing_failures: usize,
    pub copies: usize,
    pub overwrites: usize,
    pub removals: usize,
    pub skips: usize,
    pub warnings: usize,
}

impl PlanSummary {
    /// Account for one emitted action
    pub fn record(&mut self, action: &Action) {
        match action {
            Action::Copy { .. } => self.copies += 1,
            Action::Overwrite { .. } => self.overwrites += 1,
            Action::Remove { .. } => self.removals += 1,
            Action::SkipSymlink { .. } | Action::SkipOther { .. } | Action::SkipSpecial { .. } => {
                self.skips += 1
            }
            Action::ListingFailed { .. } => self.listing_failures += 1,
            Action::CannotDelete { .. } => {}
        }
        if action.is_warning() {
            self.warnings += 1;
        }
    }

    /// Number of mutating commands in the plan
    pub fn total_commands(&self) -> usize {
        self.copies + self.overwrites + self.removals
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compared {} dir pairs: {} copies, {} overwrites, {} removals, {} skipped, {} warnings, {} unreadable",
            self.pairs_compared,
            self.copies,
            self.overwrites,
            self.removals,
            self.skips,
            self.warnings,
            self.listing_failures
        )
    }
}
