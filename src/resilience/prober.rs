//! Background recovery prober.
//!
//! # Responsibilities
//! - Periodically test for spare capacity while the circuit is Degraded
//! - Flip the status back to Healthy when a trial reservation succeeds
//! - Exit once the breaker shuts down or is dropped

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::observability::{BreakerEvent, EventKind, EventSink};
use crate::resilience::limiter::ConcurrencyLimiter;
use crate::resilience::status::{CircuitStatus, StatusCell};

/// Result of a single probe tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Status was Healthy, nothing to do.
    Idle,
    /// Trial reservation succeeded, status is Healthy again.
    Repaired,
    /// Trial reservation failed, status stays Degraded.
    StillDegraded,
    /// Breaker is shut down, the loop must stop.
    Stopped,
}

pub struct RecoveryProber {
    breaker: String,
    limiter: Arc<ConcurrencyLimiter>,
    status: Arc<StatusCell>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl RecoveryProber {
    pub fn new(
        breaker: impl Into<String>,
        limiter: Arc<ConcurrencyLimiter>,
        status: Arc<StatusCell>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self {
            breaker: breaker.into(),
            limiter,
            status,
            sink,
            interval,
        }
    }

    /// Run until shutdown is signalled or the signal source is dropped.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::debug!(
            breaker = %self.breaker,
            interval_ms = self.interval.as_millis() as u64,
            "Recovery prober starting"
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.probe_once() == Probe::Stopped {
                        break;
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        tracing::debug!(breaker = %self.breaker, "Recovery prober exiting");
    }

    /// One tick of the probe loop.
    pub fn probe_once(&self) -> Probe {
        match self.status.get() {
            CircuitStatus::Shutdown => Probe::Stopped,
            CircuitStatus::Healthy => Probe::Idle,
            CircuitStatus::Degraded => match self.limiter.try_reserve() {
                Some(trial) => {
                    trial.release();
                    if self.status.mark_healthy() {
                        self.sink.record(&BreakerEvent::circuit(&self.breaker, EventKind::Repaired));
                        Probe::Repaired
                    } else if self.status.get() == CircuitStatus::Shutdown {
                        Probe::Stopped
                    } else {
                        Probe::Idle
                    }
                }
                None => {
                    self.sink.record(&BreakerEvent::circuit(&self.breaker, EventKind::StillDegraded));
                    Probe::StillDegraded
                }
            },
        }
    }
}
