//! Admission, timeout and recovery scenarios on virtual time.

use tokio::time::Instant;

use command_breaker::config::BreakerConfig;
use command_breaker::{Breaker, CircuitStatus, EventKind, Outcome};

mod common;
use common::{call_log, calls, calls_of, ms, RecordingSink, ScriptedCommand};

#[tokio::test(start_paused = true)]
async fn test_timed_out_command_keeps_its_slot() {
    let sink = RecordingSink::new();
    let breaker = Breaker::with_sink("inventory", ms(50), 1, sink.clone());
    let log = call_log();
    let start = Instant::now();

    let a = breaker.execute(ScriptedCommand::new("a", ms(200), &log));
    let b = breaker.execute(ScriptedCommand::new("b", ms(10), &log));

    // B is answered at submission time.
    assert_eq!(b.await.unwrap(), Outcome::Rejected { capacity: 1 });
    assert!(start.elapsed() < ms(1));
    assert_eq!(breaker.status(), CircuitStatus::Degraded);

    assert_eq!(a.await.unwrap(), Outcome::Timeout { after: ms(50) });
    let timed_out_at = start.elapsed();
    assert!(timed_out_at >= ms(50) && timed_out_at < ms(60), "timed out at {:?}", timed_out_at);

    // A's caller moved on, its work did not.
    assert_eq!(breaker.in_flight(), 1);
    let d = breaker.execute(ScriptedCommand::new("d", ms(10), &log));
    assert!(d.await.unwrap().is_rejected());

    tokio::time::sleep_until(start + ms(220)).await;
    assert_eq!(breaker.in_flight(), 0);

    let c = breaker.execute(ScriptedCommand::new("c", ms(10), &log));
    assert_eq!(c.await.unwrap(), Outcome::Success);

    assert_eq!(calls_of(&log, "a"), vec!["run", "fallback", "cleanup", "done"]);
    assert_eq!(calls_of(&log, "b"), vec!["fallback", "cleanup"]);
    assert_eq!(calls_of(&log, "d"), vec!["fallback", "cleanup"]);
    assert_eq!(calls_of(&log, "c"), vec!["run", "done"]);

    assert_eq!(sink.count(EventKind::Rejected), 2);
    assert_eq!(sink.count(EventKind::TimedOut), 1);
    assert_eq!(sink.count(EventKind::Succeeded), 1);
    assert_eq!(sink.count(EventKind::Degraded), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fast_commands_succeed_without_fallback() {
    let breaker = Breaker::new("search", ms(100), 2);
    let log = call_log();

    let first = breaker.execute(ScriptedCommand::new("first", ms(10), &log));
    let second = breaker.execute(ScriptedCommand::new("second", ms(10), &log));
    assert_eq!(breaker.in_flight(), 2);

    assert_eq!(first.await.unwrap(), Outcome::Success);
    assert_eq!(second.await.unwrap(), Outcome::Success);
    assert_eq!(breaker.in_flight(), 0);
    assert_eq!(breaker.status(), CircuitStatus::Healthy);

    assert!(calls(&log).iter().all(|c| !c.ends_with("fallback") && !c.ends_with("cleanup")));
}

#[tokio::test(start_paused = true)]
async fn test_excess_submissions_are_rejected_without_running() {
    let breaker = Breaker::new("orders", ms(500), 3);
    let log = call_log();

    let handles: Vec<_> = (0..5)
        .map(|i| breaker.execute(ScriptedCommand::new(&format!("c{}", i), ms(20), &log)))
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 3);
    assert_eq!(outcomes[3], Outcome::Rejected { capacity: 3 });
    assert_eq!(outcomes[4], Outcome::Rejected { capacity: 3 });
    assert_eq!(calls_of(&log, "c3"), vec!["fallback", "cleanup"]);
    assert_eq!(calls_of(&log, "c4"), vec!["fallback", "cleanup"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_rejects_without_touching_callbacks() {
    let sink = RecordingSink::new();
    let breaker = Breaker::with_sink("billing", ms(50), 4, sink.clone());
    let log = call_log();

    breaker.shutdown();
    breaker.shutdown();
    assert!(breaker.is_shutdown());
    assert_eq!(breaker.status(), CircuitStatus::Shutdown);

    for i in 0..3 {
        let handle = breaker.execute(ScriptedCommand::new(&format!("late{}", i), ms(1), &log));
        let outcome = handle.await.unwrap();
        assert!(outcome.is_shutdown());
        assert!(outcome.into_result().is_err());
    }

    assert!(calls(&log).is_empty());
    assert_eq!(breaker.in_flight(), 0);
    assert_eq!(sink.count(EventKind::Shutdown), 1);
}

#[tokio::test(start_paused = true)]
async fn test_prober_repairs_after_capacity_frees() {
    let sink = RecordingSink::new();
    let config = BreakerConfig {
        name: "catalog".into(),
        timeout_ms: 500,
        capacity: 1,
        probe_interval_ms: 20,
    };
    let breaker = Breaker::from_config(&config, sink.clone());
    let log = call_log();

    let slow = breaker.execute(ScriptedCommand::new("slow", ms(100), &log));
    let rejected = breaker.execute(ScriptedCommand::new("extra", ms(1), &log));
    assert!(rejected.await.unwrap().is_rejected());
    assert_eq!(breaker.status(), CircuitStatus::Degraded);

    tokio::time::sleep(ms(30)).await;
    assert_eq!(breaker.status(), CircuitStatus::Degraded);
    assert!(sink.count(EventKind::StillDegraded) >= 1);

    assert_eq!(slow.await.unwrap(), Outcome::Success);
    tokio::time::sleep(ms(25)).await;

    assert_eq!(breaker.status(), CircuitStatus::Healthy);
    assert_eq!(sink.count(EventKind::Repaired), 1);
    assert_eq!(breaker.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_degraded_status_does_not_gate_admission() {
    let config = BreakerConfig {
        name: "profiles".into(),
        timeout_ms: 500,
        capacity: 1,
        probe_interval_ms: 10_000,
    };
    let breaker = Breaker::from_config(&config, RecordingSink::new());
    let log = call_log();

    let busy = breaker.execute(ScriptedCommand::new("busy", ms(10), &log));
    assert!(breaker.execute(ScriptedCommand::new("x", ms(1), &log)).await.unwrap().is_rejected());
    busy.await.unwrap();

    assert_eq!(breaker.status(), CircuitStatus::Degraded);
    let next = breaker.execute(ScriptedCommand::new("next", ms(1), &log));
    assert_eq!(next.await.unwrap(), Outcome::Success);
}

#[tokio::test(start_paused = true)]
async fn test_per_command_timeout_overrides_default() {
    let breaker = Breaker::new("reports", ms(1_000), 1);
    let log = call_log();
    let start = Instant::now();

    let mut command = ScriptedCommand::new("quick-deadline", ms(100), &log);
    command.timeout = Some(ms(20));

    assert_eq!(breaker.execute(command).await.unwrap(), Outcome::Timeout { after: ms(20) });
    assert!(start.elapsed() < ms(30));
}

#[tokio::test(start_paused = true)]
async fn test_events_carry_invocation_context() {
    let sink = RecordingSink::new();
    let breaker = Breaker::with_sink("ledger", ms(10), 1, sink.clone());
    let log = call_log();

    let slow = breaker.execute(ScriptedCommand::new("slow", ms(50), &log));
    assert!(slow.await.unwrap().is_timeout());

    let timed_out = sink
        .events()
        .into_iter()
        .find(|e| e.kind == EventKind::TimedOut)
        .unwrap();
    assert_eq!(timed_out.breaker, "ledger");
    assert_eq!(timed_out.command.as_deref(), Some("slow"));
    assert!(timed_out.invocation_id.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_try_outcome_without_waiting() {
    let breaker = Breaker::new("poll", ms(100), 1);
    let log = call_log();

    let mut running = breaker.execute(ScriptedCommand::new("long", ms(30), &log));
    let mut rejected = breaker.execute(ScriptedCommand::new("short", ms(1), &log));

    assert!(running.try_outcome().is_none());
    assert!(matches!(rejected.try_outcome(), Some(Ok(Outcome::Rejected { .. }))));

    tokio::time::sleep(ms(40)).await;
    assert!(matches!(running.try_outcome(), Some(Ok(Outcome::Success))));
}
