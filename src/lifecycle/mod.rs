//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker::shutdown()
//!     → shutdown.rs (flip the one-shot flag, broadcast wake-up)
//!     → execute() observes the flag: every submission answers Shutdown
//!     → recovery prober observes the broadcast: loop exits
//! ```
//!
//! # Design Decisions
//! - Shutdown is monotonic: false → true, never back
//! - Dropping the last breaker handle closes the broadcast, which also stops the prober

pub mod shutdown;

pub use shutdown::ShutdownLatch;
