//! Metrics collection on the `metrics` facade.
//!
//! # Metrics
//! - `breaker_events_total` (counter): events by breaker, kind
//! - `breaker_status` (gauge): 0=healthy, 1=degraded, 2=shutdown
//!
//! # Design Decisions
//! - No exporter here; recording is a no-op until the host installs a recorder
//! - Status gauge is driven by the transition events, not by polling

use crate::observability::events::{BreakerEvent, EventKind};
use crate::resilience::status::CircuitStatus;

/// Count an event and update the status gauge on transitions.
pub fn record_event(event: &BreakerEvent) {
    metrics::counter!(
        "breaker_events_total",
        "breaker" => event.breaker.clone(),
        "kind" => event.kind.as_str()
    )
    .increment(1);

    let status = match event.kind {
        EventKind::Degraded => Some(CircuitStatus::Degraded),
        EventKind::Repaired => Some(CircuitStatus::Healthy),
        EventKind::Shutdown => Some(CircuitStatus::Shutdown),
        _ => None,
    };
    if let Some(status) = status {
        record_status(&event.breaker, status);
    }
}

/// Record the current status of a breaker.
pub fn record_status(breaker: &str, status: CircuitStatus) {
    metrics::gauge!("breaker_status", "breaker" => breaker.to_string()).set(status as u8 as f64);
}
