//! Client-implemented command contract.
//!
//! # Responsibilities
//! - Name the unit of work for logging and metrics
//! - Run the work itself
//! - Provide the fallback and cleanup actions the breaker invokes on
//!   rejection, timeout or failure
//! - Optionally override the breaker-level timeout
//!
//! # Failure Contract
//! Callbacks report abnormal failure by returning `Err(CommandError)`:
//! - `run` fails: `fallback` then `cleanup` run, the caller gets the error
//! - `fallback` fails: `cleanup` is NEVER called, the caller gets the error
//! - `cleanup` fails: the caller gets the error

use std::time::Duration;
use async_trait::async_trait;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error reported by a client callback.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CommandError {
    /// Create an error from a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error that wraps an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for CommandError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// A unit of work submitted through a [`Breaker`](crate::resilience::Breaker).
///
/// `run` may be abandoned by the breaker on timeout but is never cancelled:
/// it keeps running, and keeps its capacity slot, until it completes.
#[async_trait]
pub trait Command: Send + Sync + 'static {
    /// Identifier used in logs and metrics.
    fn name(&self) -> &str;

    /// The actual work.
    async fn run(&self) -> Result<(), CommandError>;

    /// Default behavior when the work is rejected, times out or fails.
    fn fallback(&self) -> Result<(), CommandError>;

    /// Resource reclamation, always invoked after a successful `fallback`.
    fn cleanup(&self) -> Result<(), CommandError>;

    /// Per-command timeout overriding the breaker default.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}
