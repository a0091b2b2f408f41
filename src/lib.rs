//! In-process circuit breaker / bulkhead for commands against a downstream dependency.
//!
//! Guarantees bounded concurrency, timeout isolation with client fallbacks,
//! and non-blocking background health probing.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::AppConfig;
pub use observability::{BreakerEvent, EventKind, EventSink, TracingSink};
pub use resilience::{
    Breaker, BreakerError, BreakerRegistry, BreakerSnapshot, CircuitStatus, Command,
    CommandError, ExecutionHandle, Outcome, OutcomeCause, OutcomeKind,
};
