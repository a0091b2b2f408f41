//! Timeout resolution and the completion race.
//!
//! # Responsibilities
//! - Resolve the effective timeout once per submission
//! - Race a detached command task against its deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Losing the race detaches the task, it is never aborted

use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};

use crate::resilience::command::Command;

/// Per-command override if present, else the breaker default.
pub fn effective_timeout<C: Command + ?Sized>(command: &C, default: Duration) -> Duration {
    command.timeout().unwrap_or(default)
}

/// Result of racing a task against its deadline.
#[derive(Debug)]
pub enum Race<T> {
    /// The task finished first.
    Finished(T),
    /// The task ended abnormally (panic or runtime cancellation).
    Crashed(JoinError),
    /// The deadline fired first; the task keeps running detached.
    Elapsed,
}

/// Wait for `task` at most `deadline`.
pub async fn race<T>(task: JoinHandle<T>, deadline: Duration) -> Race<T> {
    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(value)) => Race::Finished(value),
        Ok(Err(join_error)) => Race::Crashed(join_error),
        Err(_) => Race::Elapsed,
    }
}
