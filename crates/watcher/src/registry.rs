//! Registry of watched directories
//!
//! The single shared mutable structure of the engine. Every read and write
//! goes through one `RwLock`, so the scheduler's per-iteration plan is a
//! consistent point-in-time copy and snapshots are only ever replaced
//! wholesale.

use crate::logging::LogSwitch;
use ahash::AHashMap;
use parking_lot::RwLock;
use pollwatch_core::{FileProvider, Result, Snapshot, WatchError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Watch state for one directory
#[derive(Debug, Clone)]
struct WatchedDirectory {
    interval: Duration,
    /// `None` until the baseline capture completed
    snapshot: Option<Arc<Snapshot>>,
    /// Distinguishes re-registrations of the same path
    generation: u64,
}

/// What the scheduler needs to poll one directory
#[derive(Debug, Clone)]
pub struct PollTarget {
    pub path: PathBuf,
    pub interval: Duration,
    /// Snapshot to diff against; `None` means a baseline capture is due
    pub previous: Option<Arc<Snapshot>>,
    pub generation: u64,
}

/// Concurrency-safe store of watch state
pub struct WatchRegistry {
    provider: Arc<dyn FileProvider>,
    watches: RwLock<AHashMap<PathBuf, WatchedDirectory>>,
    next_generation: AtomicU64,
    logging: LogSwitch,
    /// Capture the baseline in `add` instead of on the first poll
    baseline_on_add: bool,
}

impl WatchRegistry {
    pub fn new(provider: Arc<dyn FileProvider>, logging: LogSwitch, baseline_on_add: bool) -> Self {
        Self {
            provider,
            watches: RwLock::new(AHashMap::new()),
            next_generation: AtomicU64::new(1),
            logging,
            baseline_on_add,
        }
    }

    /// Register `path`, replacing any previous registration
    ///
    /// With `baseline_on_add` the baseline snapshot is taken here,
    /// synchronously on the calling thread.
    ///
    /// Returns error if:
    /// - `path` is empty or `interval` is zero (`InvalidArgument`)
    /// - the provider reports the directory absent (`DirectoryNotFound`)
    pub fn add(&self, path: impl AsRef<Path>, interval: Duration) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(WatchError::InvalidArgument("watch path must not be empty".into()));
        }
        if interval.is_zero() {
            return Err(WatchError::InvalidArgument(format!(
                "polling interval for {} must be greater than zero",
                path.display()
            )));
        }
        if !self.provider.directory_exists(path) {
            return Err(WatchError::DirectoryNotFound(path.to_path_buf()));
        }

        // Filesystem access stays outside the lock
        let snapshot = if self.baseline_on_add {
            Some(Arc::new(self.provider.snapshot(path)?))
        } else {
            None
        };

        let entry = WatchedDirectory {
            interval,
            snapshot,
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
        };
        self.watches.write().insert(path.to_path_buf(), entry);

        if self.logging.enabled() {
            info!(
                "Added watch for {} with polling interval {} ms",
                path.display(),
                interval.as_millis()
            );
        }
        Ok(())
    }

    /// Unregister `path`; returns whether it was registered
    ///
    /// Removing an unknown path is not an error.
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(WatchError::InvalidArgument("watch path must not be empty".into()));
        }

        let removed = self.watches.write().remove(path).is_some();

        if removed && self.logging.enabled() {
            info!("Removed watch for {}", path.display());
        }
        Ok(removed)
    }

    /// Latest snapshot recorded for `path`
    pub fn snapshot_of(&self, path: impl AsRef<Path>) -> Option<Arc<Snapshot>> {
        self.watches
            .read()
            .get(path.as_ref())
            .and_then(|w| w.snapshot.clone())
    }

    pub fn interval_of(&self, path: impl AsRef<Path>) -> Option<Duration> {
        self.watches.read().get(path.as_ref()).map(|w| w.interval)
    }

    /// Registered paths in sorted order
    pub fn list_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.watches.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.watches.read().contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.watches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.read().is_empty()
    }

    /// Drop every watch (engine shutdown)
    pub fn clear(&self) {
        self.watches.write().clear();
    }

    /// Point-in-time copy of every watch, taken under a single lock
    pub fn plan(&self) -> Vec<PollTarget> {
        let mut targets: Vec<_> = self
            .watches
            .read()
            .iter()
            .map(|(path, w)| PollTarget {
                path: path.clone(),
                interval: w.interval,
                previous: w.snapshot.clone(),
                generation: w.generation,
            })
            .collect();
        targets.sort_by(|a, b| a.path.cmp(&b.path));
        targets
    }

    /// Current poll target for a single path
    pub fn target(&self, path: impl AsRef<Path>) -> Option<PollTarget> {
        let path = path.as_ref();
        self.watches.read().get(path).map(|w| PollTarget {
            path: path.to_path_buf(),
            interval: w.interval,
            previous: w.snapshot.clone(),
            generation: w.generation,
        })
    }

    /// Replace the stored snapshot for `target`
    ///
    /// No-op (returns false) if the watch was removed or re-registered
    /// since `target` was planned, so an in-flight poll never resurrects
    /// or overwrites a newer registration.
    pub fn store(&self, target: &PollTarget, snapshot: Arc<Snapshot>) -> bool {
        match self.watches.write().get_mut(&target.path) {
            Some(entry) if entry.generation == target.generation => {
                entry.snapshot = Some(snapshot);
                true
            }
            _ => false,
        }
    }
}
