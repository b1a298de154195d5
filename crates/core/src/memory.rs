//! In-memory `FileProvider` for tests and simulations

use crate::error::{Result, WatchError};
use crate::provider::FileProvider;
use crate::snapshot::Snapshot;
use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[derive(Debug, Default)]
struct Directory {
    files: BTreeMap<PathBuf, SystemTime>,
    /// One-shot failure returned by the next `snapshot` call
    fail_next: Option<io::ErrorKind>,
    snapshot_calls: usize,
}

#[derive(Debug, Default)]
struct State {
    directories: AHashMap<PathBuf, Directory>,
    /// Logical clock so every write gets a distinct timestamp
    ticks: u64,
}

impl State {
    fn next_time(&mut self) -> SystemTime {
        self.ticks += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.ticks)
    }

    fn directory_mut(&mut self, dir: &Path) -> Result<&mut Directory> {
        self.directories
            .get_mut(dir)
            .ok_or_else(|| WatchError::DirectoryNotFound(dir.to_path_buf()))
    }
}

/// Fake filesystem holding flat directories in memory
///
/// File paths are `dir.join(name)`, matching what the local provider
/// reports.
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    state: Mutex<State>,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty directory (no-op if it exists)
    pub fn add_directory(&self, dir: impl AsRef<Path>) {
        self.state
            .lock()
            .directories
            .entry(dir.as_ref().to_path_buf())
            .or_default();
    }

    /// Delete a directory and all of its files
    pub fn remove_directory(&self, dir: impl AsRef<Path>) -> bool {
        self.state.lock().directories.remove(dir.as_ref()).is_some()
    }

    /// Create (or overwrite) a file with a fresh timestamp
    pub fn add_file(&self, dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let mut state = self.state.lock();
        let mtime = state.next_time();
        let path = dir.join(name);
        state.directory_mut(dir)?.files.insert(path.clone(), mtime);
        Ok(path)
    }

    /// Advance the timestamp of an existing file
    pub fn touch_file(&self, dir: impl AsRef<Path>, name: &str) -> Result<SystemTime> {
        let dir = dir.as_ref();
        let mut state = self.state.lock();
        let mtime = state.next_time();
        let path = dir.join(name);
        match state.directory_mut(dir)?.files.get_mut(&path) {
            Some(slot) => {
                *slot = mtime;
                Ok(mtime)
            }
            None => Err(WatchError::from_io(
                path,
                io::Error::from(io::ErrorKind::NotFound),
            )),
        }
    }

    /// Set an explicit timestamp, creating the file if needed
    pub fn set_modified(
        &self,
        dir: impl AsRef<Path>,
        name: &str,
        mtime: SystemTime,
    ) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let path = dir.join(name);
        self.state
            .lock()
            .directory_mut(dir)?
            .files
            .insert(path.clone(), mtime);
        Ok(path)
    }

    /// Remove a file; returns whether it existed
    pub fn remove_file(&self, dir: impl AsRef<Path>, name: &str) -> Result<bool> {
        let dir = dir.as_ref();
        let path = dir.join(name);
        Ok(self.state.lock().directory_mut(dir)?.files.remove(&path).is_some())
    }

    /// Make the next `snapshot` of `dir` fail with an I/O error of `kind`
    pub fn fail_next(&self, dir: impl AsRef<Path>, kind: io::ErrorKind) -> Result<()> {
        self.state.lock().directory_mut(dir.as_ref())?.fail_next = Some(kind);
        Ok(())
    }

    /// Number of `snapshot` calls made against `dir`
    pub fn snapshot_calls(&self, dir: impl AsRef<Path>) -> usize {
        self.state
            .lock()
            .directories
            .get(dir.as_ref())
            .map_or(0, |d| d.snapshot_calls)
    }
}

impl FileProvider for MemoryFileProvider {
    fn directory_exists(&self, path: &Path) -> bool {
        self.state.lock().directories.contains_key(path)
    }

    fn snapshot(&self, path: &Path) -> Result<Snapshot> {
        let mut state = self.state.lock();
        let dir = state.directory_mut(path)?;
        dir.snapshot_calls += 1;

        if let Some(kind) = dir.fail_next.take() {
            return Err(WatchError::from_io(path, io::Error::from(kind)));
        }

        Ok(Snapshot::from_entries(
            dir.files.iter().map(|(p, t)| (p.clone(), *t)),
        ))
    }

    fn last_modified(&self, path: &Path) -> Result<SystemTime> {
        let state = self.state.lock();
        path.parent()
            .and_then(|parent| state.directories.get(parent))
            .and_then(|dir| dir.files.get(path).copied())
            .ok_or_else(|| WatchError::from_io(path, io::Error::from(io::ErrorKind::NotFound)))
    }
}
