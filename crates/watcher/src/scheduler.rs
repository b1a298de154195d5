//! Poll scheduler
//!
//! Drives repeated polling of every registered directory. Each
//! directory's poll-and-pause unit runs as its own task, so I/O across
//! directories proceeds in parallel while a single directory is never
//! polled again before its previous poll and pause finished.
//!
//! Two pacing strategies (see [`SchedulingMode`]):
//! - Lockstep: a global iteration waits for every directory's poll and
//!   pause before planning the next one. With mixed intervals the
//!   fastest directory is throttled to the slowest one's cadence.
//! - Independent: one long-lived task per directory with its own timer,
//!   reconciled against the registry every idle tick.

use crate::dispatch::{EventDispatcher, PollFailure};
use crate::logging::LogSwitch;
use crate::registry::{PollTarget, WatchRegistry};
use crate::shutdown::ShutdownListener;
use ahash::AHashMap;
use pollwatch_core::{diff, FileProvider, Result, SchedulingMode, WatchError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info, warn};

/// Result of one successful poll of one directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// First capture for the directory; no events were emitted
    Baseline { files: usize },
    /// Diffed against the previous snapshot; `events` were dispatched
    Diffed { events: usize },
}

/// Engine loop polling every watched directory
pub struct PollScheduler {
    registry: Arc<WatchRegistry>,
    provider: Arc<dyn FileProvider>,
    dispatcher: Arc<EventDispatcher>,
    logging: LogSwitch,
    mode: SchedulingMode,
    /// Recheck cadence while nothing is registered (and reconcile cadence
    /// in independent mode)
    idle_tick: Duration,
}

impl PollScheduler {
    pub fn new(
        registry: Arc<WatchRegistry>,
        provider: Arc<dyn FileProvider>,
        dispatcher: Arc<EventDispatcher>,
        logging: LogSwitch,
        mode: SchedulingMode,
        idle_tick: Duration,
    ) -> Self {
        Self {
            registry,
            provider,
            dispatcher,
            logging,
            mode,
            idle_tick,
        }
    }

    /// Run until `shutdown` fires
    pub async fn run(self: Arc<Self>, shutdown: ShutdownListener) {
        if self.logging.enabled() {
            info!("Starting poll scheduler (mode: {})", self.mode);
        }

        match self.mode {
            SchedulingMode::Lockstep => Arc::clone(&self).run_lockstep(shutdown).await,
            SchedulingMode::Independent => Arc::clone(&self).run_independent(shutdown).await,
        }

        if self.logging.enabled() {
            info!("Poll scheduler stopped");
        }
    }

    async fn run_lockstep(self: Arc<Self>, mut shutdown: ShutdownListener) {
        let mut iteration: u64 = 0;

        while !shutdown.is_triggered() {
            let targets = self.registry.plan();

            if targets.is_empty() {
                tokio::select! {
                    _ = tokio::time::sleep(self.idle_tick) => {}
                    _ = shutdown.triggered() => {}
                }
                continue;
            }

            iteration += 1;
            debug!("Poll iteration {} over {} directories", iteration, targets.len());

            let mut tasks = JoinSet::new();
            for target in targets {
                let scheduler = Arc::clone(&self);
                let mut listener = shutdown.clone();
                tasks.spawn(async move {
                    scheduler.poll_and_pause(target, &mut listener).await;
                });
            }

            // The next iteration waits for the slowest directory
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    warn!("Poll task failed: {}", e);
                }
            }
        }
    }

    async fn run_independent(self: Arc<Self>, mut shutdown: ShutdownListener) {
        let mut tasks: JoinSet<(PathBuf, u64)> = JoinSet::new();
        let mut running: AHashMap<PathBuf, (u64, AbortHandle)> = AHashMap::new();

        while !shutdown.is_triggered() {
            while let Some(joined) = tasks.try_join_next() {
                match joined {
                    Ok((path, generation)) => {
                        if running.get(&path).map(|(g, _)| *g) == Some(generation) {
                            running.remove(&path);
                        }
                    }
                    Err(e) if e.is_panic() => warn!("Directory task panicked: {}", e),
                    Err(_) => {}
                }
            }

            let targets = self.registry.plan();

            // Stop tasks whose watch was removed or re-registered
            running.retain(|path, (generation, handle)| {
                let current = targets
                    .iter()
                    .any(|t| &t.path == path && t.generation == *generation);
                if !current {
                    handle.abort();
                }
                current
            });

            for target in targets {
                if running.contains_key(&target.path) {
                    continue;
                }
                let scheduler = Arc::clone(&self);
                let listener = shutdown.clone();
                let path = target.path.clone();
                let generation = target.generation;
                let handle = tasks.spawn(async move {
                    scheduler.run_directory(path.clone(), generation, listener).await;
                    (path, generation)
                });
                running.insert(target.path, (generation, handle));
            }

            tokio::select! {
                _ = tokio::time::sleep(self.idle_tick) => {}
                _ = shutdown.triggered() => {}
            }
        }

        // Pauses are cancellable, so remaining tasks wind down promptly
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!("Directory task panicked: {}", e);
                }
            }
        }
    }

    /// Poll one directory at its own pace until it is unregistered
    async fn run_directory(&self, path: PathBuf, generation: u64, mut shutdown: ShutdownListener) {
        while !shutdown.is_triggered() {
            let target = match self.registry.target(&path) {
                Some(target) if target.generation == generation => target,
                _ => return,
            };
            self.poll_and_pause(target, &mut shutdown).await;
        }
    }

    /// One per-directory unit: poll, then pause for the directory's interval
    ///
    /// A baseline capture is not followed by a pause.
    async fn poll_and_pause(&self, target: PollTarget, shutdown: &mut ShutdownListener) {
        let interval = target.interval;

        match self.poll_directory(&target).await {
            Ok(PollOutcome::Baseline { .. }) => return,
            Ok(PollOutcome::Diffed { .. }) => {}
            Err(error) => self.handle_failure(target.path, error),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.triggered() => {}
        }
    }

    /// Capture, diff, dispatch and store for a single directory
    ///
    /// On error the previously stored snapshot is left untouched so the
    /// next cycle diffs against the last known good state.
    pub async fn poll_directory(&self, target: &PollTarget) -> Result<PollOutcome> {
        let provider = Arc::clone(&self.provider);
        let path = target.path.clone();
        let current = tokio::task::spawn_blocking(move || provider.snapshot(&path))
            .await
            .map_err(|e| WatchError::Runtime(format!("snapshot task failed: {}", e)))??;
        let current = Arc::new(current);

        let previous = match &target.previous {
            Some(previous) => previous,
            None => {
                let files = current.len();
                self.registry.store(target, current);
                if self.logging.enabled() {
                    debug!("Baseline for {}: {} files", target.path.display(), files);
                }
                return Ok(PollOutcome::Baseline { files });
            }
        };

        let changes = diff(previous, &current);
        let events = changes.len();

        for event in changes.into_events() {
            if self.logging.enabled() {
                info!("File {}: {}", event.kind, event.path.display());
            }
            self.dispatcher.dispatch(&event);
        }

        self.registry.store(target, current);
        Ok(PollOutcome::Diffed { events })
    }

    fn handle_failure(&self, path: PathBuf, error: WatchError) {
        if self.logging.enabled() {
            warn!("Polling {} failed, retrying next cycle: {}", path.display(), error);
        }
        self.dispatcher.report_failure(&PollFailure { path, error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::Shutdown;
    use parking_lot::Mutex;
    use pollwatch_core::{ChangeEvent, MemoryFileProvider};
    use std::io;
    use std::path::Path;

    struct Fixture {
        fs: Arc<MemoryFileProvider>,
        registry: Arc<WatchRegistry>,
        dispatcher: Arc<EventDispatcher>,
        scheduler: Arc<PollScheduler>,
    }

    fn fixture(mode: SchedulingMode, baseline_on_add: bool) -> Fixture {
        let fs = Arc::new(MemoryFileProvider::new());
        let logging = LogSwitch::new(false);
        let registry = Arc::new(WatchRegistry::new(fs.clone(), logging.clone(), baseline_on_add));
        let dispatcher = Arc::new(EventDispatcher::new());
        let scheduler = Arc::new(PollScheduler::new(
            registry.clone(),
            fs.clone(),
            dispatcher.clone(),
            logging,
            mode,
            Duration::from_millis(10),
        ));
        Fixture {
            fs,
            registry,
            dispatcher,
            scheduler,
        }
    }

    fn record(dispatcher: &EventDispatcher) -> Arc<Mutex<Vec<ChangeEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        dispatcher.subscribe(move |e| sink.lock().push(e.clone()));
        events
    }

    #[tokio::test]
    async fn test_poll_emits_created() {
        let f = fixture(SchedulingMode::Lockstep, true);
        f.fs.add_directory("/mock");
        f.registry.add("/mock", Duration::from_millis(100)).unwrap();
        let events = record(&f.dispatcher);

        f.fs.add_file("/mock", "a.txt").unwrap();
        let target = f.registry.target("/mock").unwrap();
        let outcome = f.scheduler.poll_directory(&target).await.unwrap();

        assert_eq!(outcome, PollOutcome::Diffed { events: 1 });
        assert_eq!(*events.lock(), vec![ChangeEvent::created("/mock/a.txt")]);
        assert_eq!(f.registry.snapshot_of("/mock").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_directory_emits_nothing() {
        let f = fixture(SchedulingMode::Lockstep, true);
        f.fs.add_directory("/mock");
        f.fs.add_file("/mock", "a.txt").unwrap();
        f.registry.add("/mock", Duration::from_millis(100)).unwrap();
        let events = record(&f.dispatcher);

        let target = f.registry.target("/mock").unwrap();
        let outcome = f.scheduler.poll_directory(&target).await.unwrap();

        assert_eq!(outcome, PollOutcome::Diffed { events: 0 });
        assert!(events.lock().is_empty());
    }

    #[tokio::test]
    async fn test_absent_snapshot_takes_baseline_without_events() {
        let f = fixture(SchedulingMode::Lockstep, false);
        f.fs.add_directory("/mock");
        f.fs.add_file("/mock", "a.txt").unwrap();
        f.registry.add("/mock", Duration::from_millis(100)).unwrap();
        let events = record(&f.dispatcher);

        let target = f.registry.target("/mock").unwrap();
        let outcome = f.scheduler.poll_directory(&target).await.unwrap();

        assert_eq!(outcome, PollOutcome::Baseline { files: 1 });
        assert!(events.lock().is_empty());
        assert!(f.registry.snapshot_of("/mock").is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_last_good_snapshot() {
        let f = fixture(SchedulingMode::Lockstep, true);
        f.fs.add_directory("/mock");
        f.fs.add_file("/mock", "a.txt").unwrap();
        f.registry.add("/mock", Duration::from_millis(100)).unwrap();
        let before = f.registry.snapshot_of("/mock").unwrap();

        f.fs.fail_next("/mock", io::ErrorKind::PermissionDenied).unwrap();
        let target = f.registry.target("/mock").unwrap();
        let err = f.scheduler.poll_directory(&target).await.unwrap_err();

        assert!(matches!(err, WatchError::Provider { .. }));
        assert!(Arc::ptr_eq(&before, &f.registry.snapshot_of("/mock").unwrap()));
    }

    #[tokio::test]
    async fn test_lockstep_failure_isolated_per_directory() {
        let f = fixture(SchedulingMode::Lockstep, true);
        f.fs.add_directory("/good");
        f.fs.add_directory("/bad");
        f.registry.add("/good", Duration::from_millis(20)).unwrap();
        f.registry.add("/bad", Duration::from_millis(20)).unwrap();

        let events = record(&f.dispatcher);
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();
        f.dispatcher.on_error(move |failure| sink.lock().push(failure.path.clone()));

        f.fs.remove_directory("/bad");
        f.fs.add_file("/good", "a.txt").unwrap();

        let (shutdown, listener) = Shutdown::channel();
        let handle = tokio::spawn(f.scheduler.clone().run(listener));

        tokio::time::timeout(Duration::from_secs(5), async {
            while events.lock().is_empty() || failures.lock().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.trigger();
        handle.await.unwrap();

        assert_eq!(events.lock()[0], ChangeEvent::created("/good/a.txt"));
        assert!(failures.lock().iter().all(|p| p == Path::new("/bad")));
        assert!(f.registry.contains("/bad"));
    }

    #[tokio::test]
    async fn test_independent_mode_polls_and_stops() {
        let f = fixture(SchedulingMode::Independent, true);
        f.fs.add_directory("/mock");
        f.registry.add("/mock", Duration::from_millis(10)).unwrap();
        let events = record(&f.dispatcher);

        let (shutdown, listener) = Shutdown::channel();
        let handle = tokio::spawn(f.scheduler.clone().run(listener));

        f.fs.add_file("/mock", "a.txt").unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while events.lock().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(events.lock()[0], ChangeEvent::created("/mock/a.txt"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_mode_stops_polling_removed_directory() {
        let f = fixture(SchedulingMode::Independent, true);
        f.fs.add_directory("/mock");
        f.registry.add("/mock", Duration::from_millis(10)).unwrap();

        let (shutdown, listener) = Shutdown::channel();
        let handle = tokio::spawn(f.scheduler.clone().run(listener));

        tokio::time::timeout(Duration::from_secs(5), async {
            while f.fs.snapshot_calls("/mock") < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        f.registry.remove("/mock").unwrap();
        // Allow an in-flight poll plus one reconcile tick to settle
        tokio::time::sleep(Duration::from_millis(100)).await;
        let settled = f.fs.snapshot_calls("/mock");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(f.fs.snapshot_calls("/mock"), settled);

        shutdown.trigger();
        handle.await.unwrap();
    }
}
