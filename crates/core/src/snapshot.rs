//! Point-in-time directory listings

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Listing of one directory: file path -> last-modified time
///
/// Immutable once built. A new poll produces a new `Snapshot`; holders
/// share it as `Arc<Snapshot>` and replace it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Sorted by path so iteration (and therefore diffing) is deterministic
    entries: BTreeMap<PathBuf, SystemTime>,
}

impl Snapshot {
    /// Snapshot of an empty directory
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(path, mtime)` pairs
    ///
    /// A path that appears more than once keeps its last timestamp.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, SystemTime)>,
        P: Into<PathBuf>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(path, mtime)| (path.into(), mtime))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last-modified time recorded for `path`
    pub fn get(&self, path: &Path) -> Option<SystemTime> {
        self.entries.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&Path, SystemTime)> {
        self.entries.iter().map(|(p, t)| (p.as_path(), *t))
    }

    /// Paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }
}

impl<P: Into<PathBuf>> FromIterator<(P, SystemTime)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (P, SystemTime)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}
