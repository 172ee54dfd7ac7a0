//! Cross-thread stop flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Asks a running capture to stop.
///
/// Cloned into the Ctrl+C handler; the capture loop checks it between
/// reads, so a stop request is seen within one radio poll interval.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Calling it again has no further effect.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
