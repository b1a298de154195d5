//! Polling file watcher
//!
//! Watches directories on filesystems where native change notification is
//! unavailable or unreliable (container overlays, network mounts):
//! - Per-directory polling intervals
//! - Snapshot diffing into created/deleted/modified events
//! - Callback and channel subscribers
//! - Per-directory failure isolation and graceful shutdown
//!
//! ```no_run
//! use pollwatch::{PollingWatcher, WatcherConfig};
//! use std::time::Duration;
//!
//! # async fn demo() -> pollwatch::Result<()> {
//! let watcher = PollingWatcher::with_local_provider(WatcherConfig::default())?;
//! watcher.subscribe(|event| println!("{}", event));
//! watcher.add_watch("/data/inbox", Duration::from_millis(500))?;
//! // ...
//! watcher.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod engine;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod shutdown;

// Re-exports
pub use dispatch::{EventDispatcher, PollFailure, SubscriptionId};
pub use engine::PollingWatcher;
pub use logging::LogSwitch;
pub use registry::{PollTarget, WatchRegistry};
pub use scheduler::{PollOutcome, PollScheduler};
pub use shutdown::{Shutdown, ShutdownListener};

pub use pollwatch_core::{
    diff, ChangeEvent, ChangeKind, FileProvider, LocalFileProvider, MemoryFileProvider, Result,
    SchedulingMode, Snapshot, SnapshotDiff, WatchError, WatchSpec, WatcherConfig,
};
