//! Watcher configuration
//!
//! Loaded from TOML, e.g.:
//! ```toml
//! enable_logging = true
//! scheduling = "lockstep"
//! idle_tick_ms = 100
//! shutdown_timeout_ms = 2000
//! baseline_on_add = true
//!
//! [[watches]]
//! path = "/data/inbox"
//! interval_ms = 500
//! ```

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// How per-directory polling is paced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMode {
    /// Global iterations: the next round starts once every directory
    /// finished its poll and its pause, so the slowest interval gates
    /// the fastest directory
    #[default]
    Lockstep,
    /// One task per directory with its own timer
    Independent,
}

impl fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingMode::Lockstep => f.write_str("lockstep"),
            SchedulingMode::Independent => f.write_str("independent"),
        }
    }
}

impl FromStr for SchedulingMode {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lockstep" => Ok(SchedulingMode::Lockstep),
            "independent" => Ok(SchedulingMode::Independent),
            other => Err(WatchError::Config(format!(
                "unknown scheduling mode '{}' (expected lockstep or independent)",
                other
            ))),
        }
    }
}

/// A directory registered at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSpec {
    pub path: PathBuf,
    pub interval_ms: u64,
}

impl WatchSpec {
    /// The interval is stored in whole milliseconds; any sub-millisecond
    /// remainder rounds up, so a non-zero duration never becomes zero.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        let mut millis = interval.as_millis();
        if interval.subsec_nanos() % 1_000_000 != 0 {
            millis += 1;
        }
        Self {
            path: path.into(),
            interval_ms: u64::try_from(millis).unwrap_or(u64::MAX),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Log lifecycle and change events through `tracing`
    pub enable_logging: bool,

    /// Pacing strategy (default: lockstep)
    pub scheduling: SchedulingMode,

    /// How often an idle scheduler rechecks the registry
    pub idle_tick_ms: u64,

    /// Bounded wait for in-flight polls on shutdown
    pub shutdown_timeout_ms: u64,

    /// Capture the baseline snapshot inside `add_watch` (otherwise on the
    /// first poll cycle)
    pub baseline_on_add: bool,

    /// Directories to watch from startup
    pub watches: Vec<WatchSpec>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            scheduling: SchedulingMode::Lockstep,
            idle_tick_ms: 100,
            shutdown_timeout_ms: 2000,
            baseline_on_add: true,
            watches: Vec::new(),
        }
    }
}

impl WatcherConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| WatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WatchError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| WatchError::Config(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.idle_tick_ms == 0 {
            return Err(WatchError::Config("idle_tick_ms must be > 0".into()));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(WatchError::Config("shutdown_timeout_ms must be > 0".into()));
        }
        for watch in &self.watches {
            if watch.path.as_os_str().is_empty() {
                return Err(WatchError::Config("watch path must not be empty".into()));
            }
            if watch.interval_ms == 0 {
                return Err(WatchError::Config(format!(
                    "interval_ms for {} must be > 0",
                    watch.path.display()
                )));
            }
        }
        Ok(())
    }

    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
