//! Core types for Pollwatch
//!
//! This crate provides the pieces of the polling watcher that do not need
//! a runtime:
//! - Directory snapshots (path -> last-modified time)
//! - The snapshot differ that classifies created/deleted/modified files
//! - The `FileProvider` seam with local and in-memory implementations
//! - Error taxonomy and engine configuration

pub mod config;
pub mod diff;
pub mod error;
pub mod memory;
pub mod provider;
pub mod snapshot;

// Re-exports
pub use config::{SchedulingMode, WatchSpec, WatcherConfig};
pub use diff::{diff, ChangeEvent, ChangeKind, SnapshotDiff};
pub use error::{Result, WatchError};
pub use memory::MemoryFileProvider;
pub use provider::{FileProvider, LocalFileProvider};
pub use snapshot::Snapshot;
