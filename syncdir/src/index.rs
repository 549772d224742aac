//! Name-sorted index over one right-side directory listing

use std::ffi::OsStr;

use crate::entry::Entry;

/// Outcome of matching entries across a directory pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult<'a> {
    /// Both sides have an entry with this name
    Matched { left: &'a Entry, right: &'a Entry },
    /// Only the left side has it
    UnmatchedLeft(&'a Entry),
    /// Only the right side has it
    UnmatchedRight(&'a Entry),
}

/// Right-side entries sorted by name, each with a `processed` flag.
///
/// Entries are never removed. A successful match flags the entry, and whatever
/// is still unflagged after the left pass is what the right side has extra.
#[derive(Debug, Default)]
pub struct RightIndex {
    entries: Vec<Entry>,
    processed: Vec<bool>,
}

impl RightIndex {
    /// Build an index over an unordered listing
    pub fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let processed = vec![false; entries.len()];
        Self { entries, processed }
    }

    fn position(&self, name: &OsStr) -> Option<usize> {
        self.entries
            .binary_search_by(|probe| probe.name.as_os_str().cmp(name))
            .ok()
    }

    /// Match a left entry against the index, flagging the right entry on success
    pub fn match_left<'a>(&'a mut self, left: &'a Entry) -> MatchResult<'a> {
        match self.position(&left.name) {
            Some(idx) => {
                self.processed[idx] = true;
                MatchResult::Matched {
                    left,
                    right: &self.entries[idx],
                }
            }
            None => MatchResult::UnmatchedLeft(left),
        }
    }

    /// Entries never matched during the left pass, in name order
    pub fn unprocessed(&self) -> impl Iterator<Item = MatchResult<'_>> + '_ {
        self.entries
            .iter()
            .zip(self.processed.iter())
            .filter(|(_, processed)| !**processed)
            .map(|(entry, _)| MatchResult::UnmatchedRight(entry))
    }
}
