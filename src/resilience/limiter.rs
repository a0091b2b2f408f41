//! Fixed-capacity concurrency limiter.
//!
//! # Responsibilities
//! - Grant or deny a reservation without ever blocking
//! - Enforce `reserved <= capacity` under concurrent callers
//! - Release the slot exactly once per reservation, on every exit path
//!
//! # Design Decisions
//! - No waiting variant: the breaker does admission control, never queuing
//! - Reservations are RAII guards, so release survives timeouts and panics

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Admission gate shared by all callers of one breaker.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    capacity: usize,
    reserved: AtomicUsize,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            reserved: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of outstanding reservations.
    pub fn reserved(&self) -> usize {
        self.reserved.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.reserved())
    }

    /// Try to take one slot. Returns `None` when all slots are taken.
    pub fn try_reserve(self: &Arc<Self>) -> Option<Reservation> {
        let mut prev = self.reserved.load(Ordering::Acquire);
        loop {
            if prev >= self.capacity {
                return None;
            }
            match self.reserved.compare_exchange_weak(
                prev, prev + 1, Ordering::AcqRel, Ordering::Acquire
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(Reservation {
            limiter: self.clone(),
        })
    }

    fn release(&self) {
        self.reserved.fetch_sub(1, Ordering::AcqRel);
    }
}

/// One held slot. The slot returns to the limiter when this is dropped.
#[derive(Debug)]
pub struct Reservation {
    limiter: Arc<ConcurrencyLimiter>,
}

impl Reservation {
    /// Give the slot back now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
