//! Shared test doubles for breaker integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use command_breaker::{BreakerEvent, Command, CommandError, EventKind, EventSink};

/// Sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BreakerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn events(&self) -> Vec<BreakerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &BreakerEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Ordered log of the callbacks a command saw.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Callbacks seen by one command, in order, without the name prefix.
pub fn calls_of(log: &CallLog, command: &str) -> Vec<String> {
    let prefix = format!("{}:", command);
    calls(log)
        .into_iter()
        .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Command whose behavior is configured up front.
pub struct ScriptedCommand {
    pub name: String,
    pub work: Duration,
    pub log: CallLog,
    pub timeout: Option<Duration>,
    pub fail_run: bool,
    pub panic_run: bool,
    pub fail_fallback: bool,
    pub panic_fallback: bool,
    pub fail_cleanup: bool,
    /// Tracks how many scripted commands run at once, and the peak.
    pub gauge: Option<(Arc<AtomicUsize>, Arc<AtomicUsize>)>,
}

impl ScriptedCommand {
    pub fn new(name: &str, work: Duration, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            work,
            log: log.clone(),
            timeout: None,
            fail_run: false,
            panic_run: false,
            fail_fallback: false,
            panic_fallback: false,
            fail_cleanup: false,
            gauge: None,
        }
    }

    fn note(&self, what: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, what));
    }
}

#[async_trait]
impl Command for ScriptedCommand {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), CommandError> {
        self.note("run");
        if let Some((current, peak)) = &self.gauge {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
        }

        tokio::time::sleep(self.work).await;

        if let Some((current, _)) = &self.gauge {
            current.fetch_sub(1, Ordering::SeqCst);
        }
        if self.panic_run {
            panic!("scripted panic in {}", self.name);
        }
        if self.fail_run {
            return Err(CommandError::new("scripted run failure"));
        }
        self.note("done");
        Ok(())
    }

    fn fallback(&self) -> Result<(), CommandError> {
        self.note("fallback");
        if self.panic_fallback {
            panic!("scripted panic in fallback of {}", self.name);
        }
        if self.fail_fallback {
            return Err(CommandError::new("scripted fallback failure"));
        }
        Ok(())
    }

    fn cleanup(&self) -> Result<(), CommandError> {
        self.note("cleanup");
        if self.fail_cleanup {
            return Err(CommandError::new("scripted cleanup failure"));
        }
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
