//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Caller submits a Command:
//!     → circuit_breaker.rs (shutdown check, admission, pipeline)
//!     → limiter.rs (non-blocking reservation, RAII release)
//!     → timeouts.rs (effective timeout, completion race)
//!     → outcome.rs (exactly one Outcome or BreakerError per call)
//!
//! In the background:
//!     → prober.rs (trial reservation while Degraded)
//!     → status.rs (Healthy / Degraded / Shutdown)
//!
//! Many breakers:
//!     → registry.rs (named breakers built from config)
//! ```
//!
//! # Design Decisions
//! - Timeouts stop the waiting, never the work
//! - Status is for observability; capacity alone decides admission
//! - Client callback failures are values, not process aborts

pub mod circuit_breaker;
pub mod command;
pub mod limiter;
pub mod outcome;
pub mod prober;
pub mod registry;
pub mod status;
pub mod timeouts;

pub use circuit_breaker::{Breaker, BreakerSnapshot, DEFAULT_PROBE_INTERVAL};
pub use command::{Command, CommandError};
pub use outcome::{BreakerError, ExecutionHandle, Outcome, OutcomeCause, OutcomeKind, Report};
pub use registry::{BreakerRegistry, RegistryError};
pub use status::CircuitStatus;
