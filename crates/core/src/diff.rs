//! Snapshot differ
//!
//! Classifies the delta between two listings of the same directory:
//! - Created: present now, absent before
//! - Deleted: present before, absent now
//! - Modified: present in both with a different timestamp (exact comparison)

use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Type of change detected in a watched directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// File appeared
    Created,
    /// File disappeared
    Deleted,
    /// File timestamp changed
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Modified => "modified",
        };
        f.write_str(s)
    }
}

/// A single change notification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    /// Type of change
    pub kind: ChangeKind,
    /// Absolute path of the file that changed
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Created, path)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Deleted, path)
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Modified, path)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path.display())
    }
}

/// Delta between two snapshots
///
/// The three sets are disjoint by construction. Each list is in path
/// order, but callers should not rely on ordering within a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub created: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Total number of changes
    pub fn len(&self) -> usize {
        self.created.len() + self.deleted.len() + self.modified.len()
    }

    /// Events in emission order: all Created, then Deleted, then Modified
    pub fn events(&self) -> impl Iterator<Item = ChangeEvent> + '_ {
        let created = self.created.iter().map(|p| ChangeEvent::created(p.clone()));
        let deleted = self.deleted.iter().map(|p| ChangeEvent::deleted(p.clone()));
        let modified = self.modified.iter().map(|p| ChangeEvent::modified(p.clone()));
        created.chain(deleted).chain(modified)
    }

    /// Consume the diff into ordered events
    pub fn into_events(self) -> Vec<ChangeEvent> {
        let mut events = Vec::with_capacity(self.len());
        events.extend(self.created.into_iter().map(ChangeEvent::created));
        events.extend(self.deleted.into_iter().map(ChangeEvent::deleted));
        events.extend(self.modified.into_iter().map(ChangeEvent::modified));
        events
    }
}

/// Compute the delta from `previous` to `current`
pub fn diff(previous: &Snapshot, current: &Snapshot) -> SnapshotDiff {
    let mut result = SnapshotDiff::default();

    for (path, mtime) in current.iter() {
        match previous.get(path) {
            None => result.created.push(path.to_path_buf()),
            Some(before) if before != mtime => result.modified.push(path.to_path_buf()),
            Some(_) => {}
        }
    }

    result.deleted = previous
        .paths()
        .filter(|path| !current.contains(path))
        .map(Path::to_path_buf)
        .collect();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::{Duration, SystemTime};

    fn t(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn snap(entries: &[(&str, u64)]) -> Snapshot {
        entries.iter().map(|(p, s)| (*p, t(*s))).collect()
    }

    #[test]
    fn test_created_from_empty() {
        let d = diff(&Snapshot::empty(), &snap(&[("/d/a.txt", 1)]));
        assert_eq!(d.into_events(), vec![ChangeEvent::created("/d/a.txt")]);
    }

    #[test]
    fn test_deleted_to_empty() {
        let d = diff(&snap(&[("/d/a.txt", 1)]), &Snapshot::empty());
        assert_eq!(d.into_events(), vec![ChangeEvent::deleted("/d/a.txt")]);
    }

    #[test]
    fn test_modified_requires_different_timestamp() {
        let d = diff(&snap(&[("/d/a.txt", 1)]), &snap(&[("/d/a.txt", 2)]));
        assert_eq!(d.into_events(), vec![ChangeEvent::modified("/d/a.txt")]);

        let same = diff(&snap(&[("/d/a.txt", 1)]), &snap(&[("/d/a.txt", 1)]));
        assert!(same.is_empty());
    }

    #[test]
    fn test_sub_second_difference_counts() {
        let before = Snapshot::from_entries([("/d/a", t(1))]);
        let after = Snapshot::from_entries([("/d/a", t(1) + Duration::from_nanos(1))]);
        assert_eq!(diff(&before, &after).modified.len(), 1);
    }

    #[test]
    fn test_diff_against_self_is_empty() {
        let s = snap(&[("/d/a", 1), ("/d/b", 2), ("/d/c", 3)]);
        let d = diff(&s, &s);
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_sets_are_disjoint_and_symmetric() {
        let s1 = snap(&[("/d/a", 1), ("/d/b", 2), ("/d/c", 3)]);
        let s2 = snap(&[("/d/b", 2), ("/d/c", 4), ("/d/e", 5)]);

        let forward = diff(&s1, &s2);
        let created: HashSet<_> = forward.created.iter().collect();
        let deleted: HashSet<_> = forward.deleted.iter().collect();
        let modified: HashSet<_> = forward.modified.iter().collect();
        assert!(created.is_disjoint(&deleted));
        assert!(created.is_disjoint(&modified));
        assert!(deleted.is_disjoint(&modified));

        let backward = diff(&s2, &s1);
        assert_eq!(forward.created, backward.deleted);
        assert_eq!(forward.deleted, backward.created);
        assert_eq!(forward.modified, backward.modified);
    }

    #[test]
    fn test_events_grouped_created_deleted_modified() {
        let s1 = snap(&[("/d/a", 1), ("/d/m", 1), ("/d/z", 1)]);
        let s2 = snap(&[("/d/b", 1), ("/d/m", 2), ("/d/y", 1)]);

        let kinds: Vec<_> = diff(&s1, &s2).events().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Created,
                ChangeKind::Created,
                ChangeKind::Deleted,
                ChangeKind::Deleted,
                ChangeKind::Modified,
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ChangeEvent::deleted("/d/a.txt").to_string(), "deleted /d/a.txt");
    }
}
