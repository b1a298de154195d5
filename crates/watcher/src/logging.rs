//! Runtime switch for engine logging

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared on/off switch for lifecycle and change logs
///
/// Cloned into the registry, the scheduler and the engine so that
/// flipping it takes effect on the next log site. Output itself goes
/// through `tracing`, which is a no-op until a subscriber is installed.
#[derive(Debug, Clone)]
pub struct LogSwitch(Arc<AtomicBool>);

impl LogSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

impl Default for LogSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}
