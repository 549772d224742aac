//! Fixtures for building left/right trees and applying plans in tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::TempDir;

use crate::action::Action;
use crate::error::Side;

/// Fixed timestamp most fixtures use
pub const T: i64 = 1_000_000;

/// A temporary directory holding a `left` and a `right` tree.
pub struct Trees {
    _dir: TempDir,
    pub left: PathBuf,
    pub right: PathBuf,
}

impl Trees {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        // Canonical so paths match what the planner prints
        let base = fs::canonicalize(dir.path()).expect("Failed to canonicalize temp dir");
        let left = base.join("left");
        let right = base.join("right");
        fs::create_dir(&left).expect("Failed to create left");
        fs::create_dir(&right).expect("Failed to create right");
        Self {
            _dir: dir,
            left,
            right,
        }
    }

    pub fn root(&self, side: Side) -> &Path {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Create a file of `size` bytes modified at `mtime` seconds, with parents.
    pub fn file(&self, side: Side, rel: &str, size: usize, mtime: i64) -> PathBuf {
        let path = self.root(side).join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&path, vec![b'x'; size]).expect("Failed to write file");
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0))
            .expect("Failed to set mtime");
        path
    }

    pub fn dir(&self, side: Side, rel: &str) -> PathBuf {
        let path = self.root(side).join(rel);
        fs::create_dir_all(&path).expect("Failed to create dir");
        path
    }

    #[cfg(unix)]
    pub fn symlink(&self, side: Side, rel: &str, target: &Path) -> PathBuf {
        let path = self.root(side).join(rel);
        std::os::unix::fs::symlink(target, &path).expect("Failed to create symlink");
        path
    }

    /// A unix socket node, the easiest special file to create unprivileged.
    #[cfg(unix)]
    pub fn socket(&self, side: Side, rel: &str) -> PathBuf {
        let path = self.root(side).join(rel);
        std::os::unix::net::UnixListener::bind(&path).expect("Failed to bind socket");
        path
    }
}

/// Carry out a plan with std::fs, the way the emitted shell lines would.
pub fn apply(actions: &[Action]) -> io::Result<()> {
    for action in actions {
        match action {
            Action::Copy {
                source,
                target_dir,
                recursive,
                ..
            } => {
                let dest = target_dir.join(file_name(source)?);
                if *recursive {
                    copy_tree(source, &dest)?;
                } else {
                    copy_file(source, &dest)?;
                }
            }
            Action::Overwrite {
                source, target_dir, ..
            } => {
                copy_file(source, &target_dir.join(file_name(source)?))?;
            }
            Action::Remove {
                path, recursive, ..
            } => {
                if *recursive {
                    fs::remove_dir_all(path)?;
                } else {
                    fs::remove_file(path)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> io::Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))
}

fn copy_file(source: &Path, dest: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    fs::copy(source, dest)?;
    filetime::set_file_mtime(dest, FileTime::from_last_modification_time(&metadata))
}

fn copy_tree(source: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir(dest)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dest.join(entry.file_name());
        if file_type.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else if file_type.is_file() {
            copy_file(&entry.path(), &target)?;
        } else if file_type.is_symlink() {
            copy_link(&entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(source)?, dest)
}

#[cfg(not(unix))]
fn copy_link(_source: &Path, _dest: &Path) -> io::Result<()> {
    Ok(())
}
