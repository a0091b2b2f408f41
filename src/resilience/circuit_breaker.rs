//! Circuit breaker / bulkhead for client commands.
//!
//! # Pipeline
//! ```text
//! execute(command)
//!     → shut down?          → Shutdown (no callback touched)
//!     → try_reserve() fails → fallback, cleanup, status Degraded → Rejected
//!     → try_reserve() ok    → spawn command (holds the reservation)
//!                           → race command against effective timeout:
//!                               command first → Success
//!                               timer first   → fallback, cleanup → Timeout
//!                                               (command keeps running, slot
//!                                                freed when it really ends)
//! ```
//!
//! # Design Decisions
//! - Admission is decided synchronously in `execute`, in call order
//! - Admission depends on live capacity and shutdown only, never on status
//! - The recovery prober starts with the breaker and stops with it

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::BreakerConfig;
use crate::lifecycle::ShutdownLatch;
use crate::observability::{BreakerEvent, EventKind, EventSink, TracingSink};
use crate::resilience::command::Command;
use crate::resilience::limiter::{ConcurrencyLimiter, Reservation};
use crate::resilience::outcome::{BreakerError, ExecutionHandle, Outcome, Report};
use crate::resilience::prober::RecoveryProber;
use crate::resilience::status::{CircuitStatus, StatusCell};
use crate::resilience::timeouts::{self, Race};

/// Default interval of the recovery prober.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Shortest probe interval a breaker will run with.
pub const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to one breaker. Clones share the same state.
///
/// Must be created inside a Tokio runtime: construction spawns the prober.
#[derive(Clone)]
pub struct Breaker {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    timeout: Duration,
    probe_interval: Duration,
    limiter: Arc<ConcurrencyLimiter>,
    status: Arc<StatusCell>,
    shutdown: ShutdownLatch,
    sink: Arc<dyn EventSink>,
    prober: JoinHandle<()>,
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub status: CircuitStatus,
    pub capacity: usize,
    pub in_flight: usize,
    pub available: usize,
    pub timeout_ms: u64,
    pub probe_interval_ms: u64,
    pub prober_running: bool,
}

impl Breaker {
    /// Create a breaker logging through the default [`TracingSink`].
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, since the recovery prober
    /// is spawned here. The same holds for [`with_sink`](Self::with_sink) and
    /// [`from_config`](Self::from_config).
    pub fn new(name: impl Into<String>, timeout: Duration, capacity: usize) -> Self {
        Self::with_sink(name, timeout, capacity, Arc::new(TracingSink))
    }

    pub fn with_sink(
        name: impl Into<String>,
        timeout: Duration,
        capacity: usize,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self::build(name.into(), timeout, capacity, DEFAULT_PROBE_INTERVAL, sink)
    }

    /// A zero `probe_interval_ms` runs the prober at [`MIN_PROBE_INTERVAL`].
    pub fn from_config(config: &BreakerConfig, sink: Arc<dyn EventSink>) -> Self {
        Self::build(
            config.name.clone(),
            config.timeout(),
            config.capacity,
            config.probe_interval(),
            sink,
        )
    }

    fn build(
        name: String,
        timeout: Duration,
        capacity: usize,
        probe_interval: Duration,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        if probe_interval < MIN_PROBE_INTERVAL {
            tracing::warn!(
                breaker = %name,
                probe_interval_ms = probe_interval.as_millis() as u64,
                min_ms = MIN_PROBE_INTERVAL.as_millis() as u64,
                "Probe interval too short, clamping"
            );
        }
        let probe_interval = probe_interval.max(MIN_PROBE_INTERVAL);

        let limiter = Arc::new(ConcurrencyLimiter::new(capacity));
        let status = Arc::new(StatusCell::new());
        let shutdown = ShutdownLatch::new();

        let prober = RecoveryProber::new(
            name.clone(),
            limiter.clone(),
            status.clone(),
            sink.clone(),
            probe_interval,
        );
        let prober = tokio::spawn(prober.run(shutdown.subscribe()));

        tracing::debug!(
            breaker = %name,
            timeout_ms = timeout.as_millis() as u64,
            capacity,
            "Breaker created"
        );

        Self {
            inner: Arc::new(Inner {
                name,
                timeout,
                probe_interval,
                limiter,
                status,
                shutdown,
                sink,
                prober,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Default timeout for commands that do not override it.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn probe_interval(&self) -> Duration {
        self.inner.probe_interval
    }

    pub fn capacity(&self) -> usize {
        self.inner.limiter.capacity()
    }

    /// Slots currently held, including commands whose caller already timed out.
    pub fn in_flight(&self) -> usize {
        self.inner.limiter.reserved()
    }

    pub fn status(&self) -> CircuitStatus {
        self.inner.status.get()
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.is_triggered()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let limiter = &self.inner.limiter;
        BreakerSnapshot {
            name: self.inner.name.clone(),
            status: self.status(),
            capacity: limiter.capacity(),
            in_flight: limiter.reserved(),
            available: limiter.available(),
            timeout_ms: self.inner.timeout.as_millis() as u64,
            probe_interval_ms: self.inner.probe_interval.as_millis() as u64,
            prober_running: self.prober_running(),
        }
    }

    /// Submit a command. Never blocks on the command itself.
    ///
    /// Rejection and shutdown are answered before this returns; on rejection
    /// `fallback` and `cleanup` run on the calling thread.
    ///
    /// # Panics
    ///
    /// Panics when an admitted command is submitted outside a Tokio runtime.
    /// A panic in `fallback` or `cleanup` on the rejection path unwinds into
    /// the caller; after admission it is reported as
    /// [`BreakerError::RecoveryPanicked`].
    pub fn execute<C: Command>(&self, command: C) -> ExecutionHandle {
        let (tx, handle) = ExecutionHandle::channel();

        if self.inner.shutdown.is_triggered() {
            let _ = tx.send(Ok(Outcome::Shutdown));
            return handle;
        }

        let invocation_id = Uuid::new_v4();
        match self.inner.limiter.try_reserve() {
            Some(reservation) => {
                let timeout = timeouts::effective_timeout(&command, self.inner.timeout);
                let inner = self.inner.clone();
                tokio::spawn(async move {
                    let report = inner
                        .run_admitted(Arc::new(command), reservation, timeout, invocation_id)
                        .await;
                    let _ = tx.send(report);
                });
            }
            None => {
                let _ = tx.send(self.inner.reject(&command, invocation_id));
            }
        }
        handle
    }

    /// Permanently close the breaker. Idempotent.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.trigger() {
            return;
        }
        self.inner.status.mark_shutdown();
        self.inner
            .sink
            .record(&BreakerEvent::circuit(&self.inner.name, EventKind::Shutdown));
    }

    /// False once the recovery prober has exited.
    pub fn prober_running(&self) -> bool {
        !self.inner.prober.is_finished()
    }
}

impl std::fmt::Debug for Breaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Breaker")
            .field("name", &self.inner.name)
            .field("status", &self.status())
            .field("in_flight", &self.in_flight())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl Inner {
    fn event(&self, command: &str, invocation_id: Uuid, kind: EventKind) -> BreakerEvent {
        BreakerEvent::invocation(&self.name, command, invocation_id, kind)
    }

    fn reject<C: Command + ?Sized>(&self, command: &C, invocation_id: Uuid) -> Report {
        self.sink.record(&self.event(command.name(), invocation_id, EventKind::Rejected));

        let recovered = self.recover(command, invocation_id);
        if self.status.mark_degraded() {
            self.sink.record(&BreakerEvent::circuit(&self.name, EventKind::Degraded));
        }
        recovered?;

        Ok(Outcome::Rejected {
            capacity: self.limiter.capacity(),
        })
    }

    /// Fallback then cleanup. A failing fallback skips cleanup.
    fn recover<C: Command + ?Sized>(&self, command: &C, invocation_id: Uuid) -> Result<(), BreakerError> {
        if let Err(source) = command.fallback() {
            self.sink.record(
                &self
                    .event(command.name(), invocation_id, EventKind::FallbackFailed)
                    .with_detail(source.to_string()),
            );
            return Err(BreakerError::Fallback {
                command: command.name().to_string(),
                source,
            });
        }

        if let Err(source) = command.cleanup() {
            self.sink.record(
                &self
                    .event(command.name(), invocation_id, EventKind::CleanupFailed)
                    .with_detail(source.to_string()),
            );
            return Err(BreakerError::Cleanup {
                command: command.name().to_string(),
                source,
            });
        }
        Ok(())
    }

    /// [`recover`](Self::recover) for admitted commands, where a panicking
    /// callback must not take down the pipeline task.
    fn recover_admitted<C: Command>(&self, command: &C, invocation_id: Uuid) -> Result<(), BreakerError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.recover(command, invocation_id))) {
            Ok(recovered) => recovered,
            Err(_) => {
                self.sink.record(
                    &self
                        .event(command.name(), invocation_id, EventKind::FallbackFailed)
                        .with_detail("panicked"),
                );
                Err(BreakerError::RecoveryPanicked {
                    command: command.name().to_string(),
                })
            }
        }
    }

    async fn run_admitted<C: Command>(
        &self,
        command: Arc<C>,
        reservation: Reservation,
        timeout: Duration,
        invocation_id: Uuid,
    ) -> Report {
        let worker = command.clone();
        let task = tokio::spawn(async move {
            // Released when the work ends, whether or not anyone still waits for it.
            let _reservation = reservation;
            worker.run().await
        });

        match timeouts::race(task, timeout).await {
            Race::Finished(Ok(())) => {
                self.sink.record(&self.event(command.name(), invocation_id, EventKind::Succeeded));
                Ok(Outcome::Success)
            }
            Race::Finished(Err(source)) => {
                self.sink.record(
                    &self
                        .event(command.name(), invocation_id, EventKind::CommandFailed)
                        .with_detail(source.to_string()),
                );
                self.recover_admitted(command.as_ref(), invocation_id)?;
                Err(BreakerError::Command {
                    command: command.name().to_string(),
                    source,
                })
            }
            Race::Crashed(join_error) if join_error.is_panic() => {
                self.sink.record(
                    &self
                        .event(command.name(), invocation_id, EventKind::CommandFailed)
                        .with_detail("panicked"),
                );
                self.recover_admitted(command.as_ref(), invocation_id)?;
                Err(BreakerError::CommandPanicked {
                    command: command.name().to_string(),
                })
            }
            Race::Crashed(_) => Err(BreakerError::Abandoned),
            Race::Elapsed => {
                self.sink.record(
                    &self
                        .event(command.name(), invocation_id, EventKind::TimedOut)
                        .with_detail(format!("after {:?}", timeout)),
                );
                self.recover_admitted(command.as_ref(), invocation_id)?;
                Ok(Outcome::Timeout { after: timeout })
            }
        }
    }
}
