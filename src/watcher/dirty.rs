//! Pending re-parse markers

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Files waiting to be re-parsed, each with its count of failed reads.
///
/// Keyed by path, so repeated edits of one file collapse into one entry.
#[derive(Debug, Default)]
pub struct DirtySet {
    entries: BTreeMap<PathBuf, u32>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a file dirty. Returns `true` if it was not dirty already.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, 0);
        true
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Drop every entry at or below `dir`
    pub fn remove_under(&mut self, dir: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|path, _| !path.starts_with(dir));
        before - self.entries.len()
    }

    /// Move an entry to a new path, keeping its attempt count
    pub fn rename(&mut self, from: &Path, to: PathBuf) -> bool {
        match self.entries.remove(from) {
            Some(attempts) => {
                self.entries.insert(to, attempts);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the dirty paths in path order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.keys().cloned().collect()
    }

    /// Count a failed read; returns the attempts so far
    pub fn record_failure(&mut self, path: &Path) -> u32 {
        match self.entries.get_mut(path) {
            Some(attempts) => {
                *attempts += 1;
                *attempts
            }
            None => 0,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
