//! Per-call results and breaker errors.
//!
//! Every submission produces exactly one `Result<Outcome, BreakerError>`:
//! - `Ok(Outcome)` for the four regular outcomes, communicated as values
//! - `Err(BreakerError)` only when a client callback failed abnormally

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::resilience::command::CommandError;

/// Terminal outcome of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command completed within its window.
    Success,
    /// The window elapsed; fallback and cleanup ran.
    Timeout { after: Duration },
    /// No capacity at submission time; fallback and cleanup ran.
    Rejected { capacity: usize },
    /// The breaker is permanently closed; no callback was touched.
    Shutdown,
}

/// Discriminant of an [`Outcome`], used for tallies and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Timeout,
    Rejected,
    Shutdown,
}

/// The underlying cause of a non-successful [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeCause {
    #[error("task timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error("reached threshold of {capacity} concurrent commands, cannot run your command")]
    CapacityExhausted { capacity: usize },

    #[error("circuit has been permanently shut down, create a new one")]
    Shutdown,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Timeout => "timeout",
            OutcomeKind::Rejected => "rejected",
            OutcomeKind::Shutdown => "shutdown",
        }
    }
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success => OutcomeKind::Success,
            Outcome::Timeout { .. } => OutcomeKind::Timeout,
            Outcome::Rejected { .. } => OutcomeKind::Rejected,
            Outcome::Shutdown => OutcomeKind::Shutdown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Outcome::Timeout { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Outcome::Shutdown)
    }

    /// The cause behind this outcome, `None` for success.
    pub fn cause(&self) -> Option<OutcomeCause> {
        match *self {
            Outcome::Success => None,
            Outcome::Timeout { after } => Some(OutcomeCause::TimedOut { after }),
            Outcome::Rejected { capacity } => Some(OutcomeCause::CapacityExhausted { capacity }),
            Outcome::Shutdown => Some(OutcomeCause::Shutdown),
        }
    }

    pub fn into_result(self) -> Result<(), OutcomeCause> {
        match self.cause() {
            None => Ok(()),
            Some(cause) => Err(cause),
        }
    }
}

/// Abnormal failures of client callbacks, propagated instead of an [`Outcome`].
#[derive(Debug, Error)]
pub enum BreakerError {
    /// `run` failed; fallback and cleanup already ran.
    #[error("command '{command}' failed: {source}")]
    Command {
        command: String,
        #[source]
        source: CommandError,
    },

    /// `run` panicked; fallback and cleanup already ran.
    #[error("command '{command}' panicked")]
    CommandPanicked { command: String },

    /// `fallback` failed; cleanup was skipped.
    #[error("fallback of command '{command}' failed: {source}")]
    Fallback {
        command: String,
        #[source]
        source: CommandError,
    },

    /// `cleanup` failed after a successful fallback.
    #[error("cleanup of command '{command}' failed: {source}")]
    Cleanup {
        command: String,
        #[source]
        source: CommandError,
    },

    /// `fallback` or `cleanup` panicked after the command was admitted.
    #[error("recovery of command '{command}' panicked")]
    RecoveryPanicked { command: String },

    /// The pipeline went away without reporting.
    #[error("execution abandoned before an outcome was reported")]
    Abandoned,
}

/// What an [`ExecutionHandle`] resolves to.
pub type Report = Result<Outcome, BreakerError>;

/// Single-delivery handle for the result of one submission.
///
/// Await it to wait for the result, or poll it with [`try_outcome`](Self::try_outcome).
/// Dropping it does not affect the submitted command.
/// Once the result has been taken, by either route, the handle reports `Abandoned`.
#[derive(Debug)]
pub struct ExecutionHandle {
    rx: Option<oneshot::Receiver<Report>>,
}

impl ExecutionHandle {
    pub(crate) fn channel() -> (oneshot::Sender<Report>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx: Some(rx) })
    }

    /// Take the result if it is already available.
    pub fn try_outcome(&mut self) -> Option<Report> {
        let Some(rx) = self.rx.as_mut() else {
            return Some(Err(BreakerError::Abandoned));
        };
        let report = match rx.try_recv() {
            Ok(report) => report,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(BreakerError::Abandoned),
        };
        self.rx = None;
        Some(report)
    }
}

impl Future for ExecutionHandle {
    type Output = Report;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(Err(BreakerError::Abandoned));
        };
        let report = match Pin::new(rx).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(received) => received.unwrap_or_else(|_| Err(BreakerError::Abandoned)),
        };
        self.rx = None;
        Poll::Ready(report)
    }
}
