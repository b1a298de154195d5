//! Shared helpers for watcher integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use pollwatch::{ChangeEvent, MemoryFileProvider, PollingWatcher, WatcherConfig};
use std::sync::Arc;
use std::time::Duration;

/// Engine config tuned for fast tests
pub fn test_config() -> WatcherConfig {
    WatcherConfig {
        enable_logging: false,
        idle_tick_ms: 10,
        shutdown_timeout_ms: 1000,
        ..WatcherConfig::default()
    }
}

pub fn memory_watcher(config: WatcherConfig) -> (Arc<MemoryFileProvider>, PollingWatcher) {
    let fs = Arc::new(MemoryFileProvider::new());
    let watcher = PollingWatcher::start(fs.clone(), config).unwrap();
    (fs, watcher)
}

/// Collect every event the watcher dispatches
pub fn record(watcher: &PollingWatcher) -> Arc<Mutex<Vec<ChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    watcher.subscribe(move |e| sink.lock().push(e.clone()));
    events
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
