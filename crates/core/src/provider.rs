//! Filesystem access seam
//!
//! The watch engine only ever talks to a `FileProvider`. The local
//! implementation reads the real filesystem; tests use
//! [`MemoryFileProvider`](crate::memory::MemoryFileProvider).

use crate::error::{Result, WatchError};
use crate::snapshot::Snapshot;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Filesystem capability consumed by the watch engine
pub trait FileProvider: Send + Sync {
    /// Check whether `path` is an existing directory
    fn directory_exists(&self, path: &Path) -> bool;

    /// List the files directly inside `path` with their modification times
    ///
    /// Fails with `DirectoryNotFound` if the directory vanished.
    fn snapshot(&self, path: &Path) -> Result<Snapshot>;

    /// Files directly inside `path`, in path order
    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        Ok(self.snapshot(path)?.paths().map(Path::to_path_buf).collect())
    }

    /// Modification time of a single file
    fn last_modified(&self, path: &Path) -> Result<SystemTime>;

    /// Check whether `path` is an existing regular file
    fn file_exists(&self, path: &Path) -> bool {
        self.last_modified(path).is_ok()
    }
}

/// `FileProvider` backed by the local filesystem
///
/// Only regular files at depth 1 are listed; subdirectories are not
/// descended into and symlinks are not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileProvider;

impl LocalFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FileProvider for LocalFileProvider {
    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn snapshot(&self, path: &Path) -> Result<Snapshot> {
        if !path.is_dir() {
            return Err(WatchError::DirectoryNotFound(path.to_path_buf()));
        }

        let mut entries = Vec::new();

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "walk failed"));
                    return Err(WatchError::from_io(path, source));
                }
                Err(e) => {
                    // Entry vanished between listing and stat
                    debug!("Skipping unreadable entry in {}: {}", path.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match entry.metadata().map_err(io::Error::from).and_then(|m| m.modified()) {
                Ok(mtime) => entries.push((entry.into_path(), mtime)),
                Err(e) => debug!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        Ok(Snapshot::from_entries(entries))
    }

    fn last_modified(&self, path: &Path) -> Result<SystemTime> {
        let metadata = std::fs::metadata(path).map_err(|e| WatchError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(WatchError::InvalidArgument(format!(
                "not a file: {}",
                path.display()
            )));
        }
        metadata.modified().map_err(|e| WatchError::from_io(path, e))
    }
}
