//! Change event fan-out
//!
//! Subscribers are invoked synchronously on the polling task, in
//! registration order. A subscriber added mid-cycle sees events from the
//! next dispatched event onward; nothing is buffered or replayed.
//!
//! A panicking callback is caught and logged so that the remaining
//! subscribers still run. There is no timeout: a slow callback delays the
//! poll cycle of its directory, keeping callbacks short is up to the
//! caller.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use pollwatch_core::{ChangeEvent, WatchError};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Handle returned by every subscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A recoverable failure while polling one directory
#[derive(Debug)]
pub struct PollFailure {
    pub path: PathBuf,
    pub error: WatchError,
}

type ChangeHandler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
type FailureHandler = Arc<dyn Fn(&PollFailure) + Send + Sync>;

#[derive(Clone)]
enum Subscriber {
    Callback(ChangeHandler),
    Channel(Sender<ChangeEvent>),
}

/// Observer registry for change events and poll failures
pub struct EventDispatcher {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    failure_handlers: RwLock<Vec<(SubscriptionId, FailureHandler)>>,
    closed: AtomicBool,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
            failure_handlers: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a callback for change events
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.subscribers
            .write()
            .push((id, Subscriber::Callback(Arc::new(callback))));
        id
    }

    /// Receive change events through an unbounded channel
    ///
    /// The subscription is dropped automatically once the receiver is.
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<ChangeEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.next_id();
        self.subscribers.write().push((id, Subscriber::Channel(tx)));
        (id, rx)
    }

    /// Register a callback for recoverable poll failures
    pub fn on_error<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PollFailure) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.failure_handlers.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription of either kind; returns whether it existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.subscribers.write().retain(|(sid, _)| {
            let keep = *sid != id;
            removed |= !keep;
            keep
        });
        self.failure_handlers.write().retain(|(sid, _)| {
            let keep = *sid != id;
            removed |= !keep;
            keep
        });
        removed
    }

    /// Number of change subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver one event to every subscriber; returns how many received it
    pub fn dispatch(&self, event: &ChangeEvent) -> usize {
        if self.is_closed() {
            return 0;
        }

        // Copy the list so callbacks may (un)subscribe without deadlocking
        let subscribers = self.subscribers.read().clone();
        let mut delivered = 0;
        let mut disconnected = Vec::new();

        for (id, subscriber) in subscribers {
            if self.is_closed() {
                break;
            }
            match subscriber {
                Subscriber::Callback(callback) => {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| callback(event)));
                    match result {
                        Ok(()) => delivered += 1,
                        Err(_) => warn!("Change subscriber panicked while handling {}", event),
                    }
                }
                Subscriber::Channel(tx) => {
                    if tx.send(event.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        disconnected.push(id);
                    }
                }
            }
        }

        for id in disconnected {
            self.unsubscribe(id);
        }
        delivered
    }

    /// Deliver a poll failure to every error subscriber
    pub fn report_failure(&self, failure: &PollFailure) {
        if self.is_closed() {
            return;
        }

        let handlers = self.failure_handlers.read().clone();
        for (_, handler) in handlers {
            if self.is_closed() {
                break;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| handler(failure))).is_err() {
                warn!(
                    "Error subscriber panicked while handling failure for {}",
                    failure.path.display()
                );
            }
        }
    }

    /// Stop delivering. After this returns no new callback invocation starts.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
