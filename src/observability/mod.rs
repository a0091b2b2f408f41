//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker pipeline / recovery prober
//!     → events.rs (BreakerEvent handed to the injected EventSink)
//!     → TracingSink (default):
//!         → structured tracing event (breaker, command, invocation_id, event)
//!         → metrics.rs (counters and status gauge on the metrics facade)
//!
//! Process setup:
//!     → logging.rs (tracing-subscriber registry, EnvFilter, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - The sink is injected per breaker, no process-wide logger handle
//! - No metrics exporter: the facade is a no-op until the host installs a recorder

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{BreakerEvent, EventKind, EventSink, TracingSink};
