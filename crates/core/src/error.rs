//! Error taxonomy for watch operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors raised by the registry, the providers and the engine
#[derive(Debug, Error)]
pub enum WatchError {
    /// Caller error: empty path, zero interval and the like
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The directory does not exist (at registration or during a poll)
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Any other filesystem failure while reading a directory
    #[error("failed to read {}: {source}", path.display())]
    Provider {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The engine was started outside of a tokio runtime
    #[error("runtime unavailable: {0}")]
    Runtime(String),

    /// Invalid or unreadable configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WatchError {
    /// Build a provider error, mapping `NotFound` to `DirectoryNotFound`
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            WatchError::DirectoryNotFound(path)
        } else {
            WatchError::Provider { path, source }
        }
    }

    /// True for conditions a poll cycle retries instead of surfacing
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WatchError::DirectoryNotFound(_) | WatchError::Provider { .. }
        )
    }
}
