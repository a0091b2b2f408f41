//! Structured breaker events and the sink they are delivered to.

use serde::Serialize;
use uuid::Uuid;

use crate::observability::metrics;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Succeeded,
    TimedOut,
    Rejected,
    Degraded,
    Repaired,
    StillDegraded,
    Shutdown,
    CommandFailed,
    FallbackFailed,
    CleanupFailed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Succeeded => "succeeded",
            EventKind::TimedOut => "timed_out",
            EventKind::Rejected => "rejected",
            EventKind::Degraded => "degraded",
            EventKind::Repaired => "repaired",
            EventKind::StillDegraded => "still_degraded",
            EventKind::Shutdown => "shutdown",
            EventKind::CommandFailed => "command_failed",
            EventKind::FallbackFailed => "fallback_failed",
            EventKind::CleanupFailed => "cleanup_failed",
        }
    }
}

/// One observable occurrence on a breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerEvent {
    /// Breaker name.
    pub breaker: String,
    /// Command name, for per-call events.
    pub command: Option<String>,
    /// Correlates all events of one submission.
    pub invocation_id: Option<Uuid>,
    pub kind: EventKind,
    /// Error text or other context.
    pub detail: Option<String>,
}

impl BreakerEvent {
    /// Event about the breaker itself (status changes, shutdown).
    pub fn circuit(breaker: &str, kind: EventKind) -> Self {
        Self {
            breaker: breaker.to_string(),
            command: None,
            invocation_id: None,
            kind,
            detail: None,
        }
    }

    /// Event about one submission.
    pub fn invocation(breaker: &str, command: &str, invocation_id: Uuid, kind: EventKind) -> Self {
        Self {
            breaker: breaker.to_string(),
            command: Some(command.to_string()),
            invocation_id: Some(invocation_id),
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Receiver of breaker events. Format and destination are up to the implementation.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &BreakerEvent);
}

/// Default sink: structured `tracing` events plus metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &BreakerEvent) {
        metrics::record_event(event);

        let command = event.command.as_deref().unwrap_or("-");
        let invocation_id = event.invocation_id.map(|id| id.to_string()).unwrap_or_default();
        let detail = event.detail.as_deref().unwrap_or("");

        match event.kind {
            EventKind::Succeeded => tracing::debug!(
                breaker = %event.breaker, command, invocation_id = %invocation_id, event = event.kind.as_str(),
                "Command completed"
            ),
            EventKind::TimedOut => tracing::info!(
                breaker = %event.breaker, command, invocation_id = %invocation_id, event = event.kind.as_str(),
                "Task timed out"
            ),
            EventKind::Rejected => tracing::warn!(
                breaker = %event.breaker, command, invocation_id = %invocation_id, event = event.kind.as_str(),
                "Reached threshold, command rejected"
            ),
            EventKind::Degraded => tracing::warn!(
                breaker = %event.breaker, event = event.kind.as_str(),
                "Circuit degraded"
            ),
            EventKind::Repaired => tracing::info!(
                breaker = %event.breaker, event = event.kind.as_str(),
                "Circuit repaired, load is normal"
            ),
            EventKind::StillDegraded => tracing::info!(
                breaker = %event.breaker, event = event.kind.as_str(),
                "Attempt to repair circuit failed"
            ),
            EventKind::Shutdown => tracing::info!(
                breaker = %event.breaker, event = event.kind.as_str(),
                "Circuit permanently shut down"
            ),
            EventKind::CommandFailed | EventKind::FallbackFailed | EventKind::CleanupFailed => {
                tracing::error!(
                    breaker = %event.breaker, command, invocation_id = %invocation_id, event = event.kind.as_str(),
                    detail, "Client callback failed"
                )
            }
        }
    }
}
