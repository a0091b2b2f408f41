//! One-shot shutdown latch.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Monotonic shutdown flag with a broadcast wake-up for background loops.
#[derive(Debug)]
pub struct ShutdownLatch {
    triggered: AtomicBool,
    tx: broadcast::Sender<()>,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            triggered: AtomicBool::new(false),
            tx,
        }
    }

    /// Subscribe to the wake-up. Receivers also wake when the latch is dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trip the latch. Returns true only for the first call.
    pub fn trigger(&self) -> bool {
        if self.triggered.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.tx.send(());
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Number of loops still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ShutdownLatch {
    fn default() -> Self {
        Self::new()
    }
}
