//! Directory entry classification
//!
//! Every entry is read with `lstat` semantics, so a symbolic link is reported
//! as a link and never as whatever it points to.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use filetime::FileTime;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Kind of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, FIFOs, device nodes
    Other,
}

impl EntryKind {
    fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// One filesystem entry with the metadata used for comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File name, the key entries are matched on
    pub name: OsString,
    pub kind: EntryKind,
    /// Last modification time
    pub modified: FileTime,
    /// Size in bytes
    pub size: u64,
    /// Location of the entry itself (parent directory joined with `name`)
    pub path: PathBuf,
}

impl Entry {
    fn from_dir_entry(entry: &fs::DirEntry) -> std::io::Result<Self> {
        // DirEntry::metadata does not traverse symlinks
        let metadata = entry.metadata()?;
        Ok(Self::from_metadata(entry.file_name(), entry.path(), &metadata))
    }

    fn from_metadata(name: OsString, path: PathBuf, metadata: &fs::Metadata) -> Self {
        Self {
            name,
            kind: EntryKind::from_file_type(metadata.file_type()),
            modified: FileTime::from_last_modification_time(metadata),
            size: metadata.len(),
            path,
        }
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    /// Size and modification time, in the form carried by actions
    pub fn stamp(&self) -> Stamp {
        Stamp {
            size: self.size,
            modified: DateTime::from_timestamp(
                self.modified.unix_seconds(),
                self.modified.nanoseconds(),
            )
            .unwrap_or_default(),
        }
    }
}

/// Size and modification time of one side of a compared pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// List a directory in the order the filesystem returns its entries.
///
/// Fails as a whole if the directory or any of its entries cannot be read.
pub fn list_dir(dir: &Path) -> Result<Vec<Entry>> {
    let read_dir = fs::read_dir(dir).map_err(|e| PlanError::listing(dir, e))?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| PlanError::listing(dir, e))?;
        let entry = Entry::from_dir_entry(&dir_entry)
            .map_err(|e| PlanError::listing(dir_entry.path(), e))?;
        entries.push(entry);
    }

    Ok(entries)
}
