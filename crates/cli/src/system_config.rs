//! Configuration file discovery and CLI overrides

use anyhow::{Context, Result};
use pollwatch::{SchedulingMode, WatchSpec, WatcherConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location: `<config dir>/pollwatch/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pollwatch").join("config.toml"))
}

/// Load configuration
///
/// An explicit path must exist. Without one, the default location is used
/// if present, otherwise built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<WatcherConfig> {
    if let Some(path) = explicit {
        return WatcherConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match config_file_path() {
        Some(path) if path.exists() => WatcherConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        _ => Ok(WatcherConfig::default()),
    }
}

/// Command-line settings that override the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub paths: Vec<PathBuf>,
    pub interval: Option<Duration>,
    pub quiet: bool,
    pub mode: Option<SchedulingMode>,
}

/// Default interval for paths given on the command line
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Merge overrides into `config` and validate the result
pub fn apply(mut config: WatcherConfig, overrides: Overrides) -> Result<WatcherConfig> {
    if overrides.quiet {
        config.enable_logging = false;
    }
    if let Some(mode) = overrides.mode {
        config.scheduling = mode;
    }

    let interval = overrides.interval.unwrap_or(DEFAULT_INTERVAL);
    for path in overrides.paths {
        // Command-line paths replace config entries for the same directory
        config.watches.retain(|w| w.path != path);
        config.watches.push(WatchSpec::new(path, interval));
    }

    config.validate().context("Invalid configuration")?;

    if config.watches.is_empty() {
        anyhow::bail!(
            "No directories to watch. Pass a path or set the FOLDER_TO_WATCH environment variable."
        );
    }
    Ok(config)
}

/// Example configuration file
pub fn example_config() -> String {
    let config = WatcherConfig {
        watches: vec![
            WatchSpec::new("/data/inbox", Duration::from_millis(500)),
            WatchSpec::new("/data/archive", Duration::from_secs(5)),
        ],
        ..WatcherConfig::default()
    };
    config
        .to_toml_string()
        .unwrap_or_else(|e| format!("# failed to render example: {}", e))
}
