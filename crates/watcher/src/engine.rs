//! Public watch engine

use crate::dispatch::{EventDispatcher, PollFailure, SubscriptionId};
use crate::logging::LogSwitch;
use crate::registry::WatchRegistry;
use crate::scheduler::PollScheduler;
use crate::shutdown::Shutdown;
use crossbeam_channel::Receiver;
use pollwatch_core::{
    ChangeEvent, FileProvider, LocalFileProvider, Result, SchedulingMode, Snapshot, WatchError,
    WatcherConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Polling file watcher
///
/// Owns the background scheduler task. Call [`shutdown`](Self::shutdown)
/// to stop it gracefully; dropping the watcher stops it abruptly.
pub struct PollingWatcher {
    registry: Arc<WatchRegistry>,
    dispatcher: Arc<EventDispatcher>,
    logging: LogSwitch,
    shutdown: Shutdown,
    task: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
    mode: SchedulingMode,
}

impl PollingWatcher {
    /// Start the engine on the current tokio runtime
    ///
    /// Watches listed in `config` are registered before the scheduler is
    /// spawned; the first failing one aborts startup.
    pub fn start(provider: Arc<dyn FileProvider>, config: WatcherConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| WatchError::Runtime(e.to_string()))?;

        let logging = LogSwitch::new(config.enable_logging);
        let registry = Arc::new(WatchRegistry::new(
            Arc::clone(&provider),
            logging.clone(),
            config.baseline_on_add,
        ));
        let dispatcher = Arc::new(EventDispatcher::new());

        for watch in &config.watches {
            registry.add(&watch.path, watch.interval())?;
        }

        let scheduler = Arc::new(PollScheduler::new(
            Arc::clone(&registry),
            provider,
            Arc::clone(&dispatcher),
            logging.clone(),
            config.scheduling,
            config.idle_tick(),
        ));

        let (shutdown, listener) = Shutdown::channel();
        let task = runtime.spawn(scheduler.run(listener));

        Ok(Self {
            registry,
            dispatcher,
            logging,
            shutdown,
            task: Some(task),
            shutdown_timeout: config.shutdown_timeout(),
            mode: config.scheduling,
        })
    }

    /// Start the engine against the local filesystem
    pub fn with_local_provider(config: WatcherConfig) -> Result<Self> {
        Self::start(Arc::new(LocalFileProvider::new()), config)
    }

    /// Watch `path`, polling every `interval`
    ///
    /// Re-adding a watched path replaces its interval and baseline.
    ///
    /// With `baseline_on_add` (the default) this lists the directory on the
    /// caller's thread before returning. From async code holding a runtime
    /// worker, call it through `tokio::task::spawn_blocking` when the
    /// directory is large or on slow storage.
    pub fn add_watch(&self, path: impl AsRef<Path>, interval: Duration) -> Result<()> {
        self.registry.add(path, interval)
    }

    /// Stop watching `path`. Unknown paths are ignored.
    ///
    /// A poll already in flight for `path` may still emit its events.
    pub fn remove_watch(&self, path: impl AsRef<Path>) -> Result<()> {
        self.registry.remove(path).map(|_| ())
    }

    /// Register a change callback
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(callback)
    }

    /// Receive change events on a channel
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<ChangeEvent>) {
        self.dispatcher.subscribe_channel()
    }

    /// Register a callback for recoverable poll failures
    pub fn on_error<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PollFailure) + Send + Sync + 'static,
    {
        self.dispatcher.on_error(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Toggle lifecycle and change logging at runtime
    pub fn set_logging_enabled(&self, enabled: bool) {
        self.logging.set(enabled);
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging.enabled()
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.registry.list_paths()
    }

    /// Latest snapshot for a watched directory
    pub fn snapshot_of(&self, path: impl AsRef<Path>) -> Option<Arc<Snapshot>> {
        self.registry.snapshot_of(path)
    }

    pub fn scheduling_mode(&self) -> SchedulingMode {
        self.mode
    }

    /// Stop the scheduler and release every watch
    ///
    /// In-flight polls get `shutdown_timeout` to finish before they are
    /// abandoned. Once this returns no further events are dispatched.
    pub async fn shutdown(mut self) {
        self.stop().await;
    }

    async fn stop(&mut self) {
        self.shutdown.trigger();

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Poll scheduler ended abnormally: {}", e),
                Err(_) => {
                    warn!(
                        "Poll scheduler did not stop within {} ms, abandoning in-flight polls",
                        self.shutdown_timeout.as_millis()
                    );
                    self.dispatcher.close();
                    task.abort();
                    let _ = task.await;
                }
            }
        }

        self.dispatcher.close();
        self.registry.clear();

        if self.logging.enabled() {
            info!("Watcher shut down");
        }
    }
}

impl Drop for PollingWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.shutdown.trigger();
            self.dispatcher.close();
            task.abort();
            self.registry.clear();
        }
    }
}
