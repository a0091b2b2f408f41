//! Circuit status state machine.
//!
//! # States
//! - Healthy: capacity was available recently (initial)
//! - Degraded: an admission was denied since the last successful probe
//! - Shutdown: permanently closed (terminal)
//!
//! # State Transitions
//! ```text
//! Healthy  → Degraded: admission denied, capacity exhausted
//! Degraded → Healthy:  prober's trial reservation succeeds
//! Degraded → Degraded: prober's trial reservation fails (logged only)
//! *        → Shutdown: explicit shutdown, irreversible
//! ```
//!
//! # Design Decisions
//! - Status is an observability cache, never an admission gate
//! - Transitions are compare-and-swap so Shutdown can never be overwritten

use std::sync::atomic::{AtomicU8, Ordering};
use serde::Serialize;

/// Circuit status.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitStatus {
    Healthy = 0,
    Degraded = 1,
    Shutdown = 2,
}

impl From<u8> for CircuitStatus {
    fn from(val: u8) -> Self {
        match val {
            0 => CircuitStatus::Healthy,
            1 => CircuitStatus::Degraded,
            _ => CircuitStatus::Shutdown,
        }
    }
}

impl CircuitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitStatus::Healthy => "healthy",
            CircuitStatus::Degraded => "degraded",
            CircuitStatus::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomically updated holder of a [`CircuitStatus`].
#[derive(Debug)]
pub struct StatusCell {
    state: AtomicU8,
}

impl StatusCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(CircuitStatus::Healthy as u8),
        }
    }

    pub fn get(&self) -> CircuitStatus {
        CircuitStatus::from(self.state.load(Ordering::Acquire))
    }

    /// Healthy → Degraded. Returns true if this call made the transition.
    pub fn mark_degraded(&self) -> bool {
        self.transition(CircuitStatus::Healthy, CircuitStatus::Degraded)
    }

    /// Degraded → Healthy. Returns true if this call made the transition.
    pub fn mark_healthy(&self) -> bool {
        self.transition(CircuitStatus::Degraded, CircuitStatus::Healthy)
    }

    /// Any → Shutdown. Returns true if the cell was not already shut down.
    pub fn mark_shutdown(&self) -> bool {
        self.state.swap(CircuitStatus::Shutdown as u8, Ordering::AcqRel)
            != CircuitStatus::Shutdown as u8
    }

    fn transition(&self, from: CircuitStatus, to: CircuitStatus) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
