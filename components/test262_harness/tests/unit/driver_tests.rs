//! Unit tests for the execution driver

use core_types::JsError;
use std::path::PathBuf;
use std::time::Duration;
use test262_harness::{
    DriverState, ExecutionDriver, ExecutionOutcome, Expectation, FailureKind, Mode, ScriptedEngine,
    Source,
};

fn source(id: &str, mode: Mode, is_async: bool) -> Source {
    Source {
        case_id: id.to_string(),
        path: PathBuf::from(id),
        mode,
        includes: Vec::new(),
        body: String::new(),
        is_async,
    }
}

#[test]
fn test_new_driver_is_pending() {
    let engine = ScriptedEngine::new();
    let driver = ExecutionDriver::new(&engine, Duration::from_secs(1));
    assert_eq!(driver.state(), DriverState::Pending);
}

#[test]
fn test_sync_case_succeeds() {
    let engine = ScriptedEngine::new().script("a.js", |ctx| {
        ctx.print("hello");
        Ok(())
    });
    let run = ExecutionDriver::new(&engine, Duration::from_secs(1))
        .execute(&source("a.js", Mode::Sloppy, false), &Expectation::Complete);
    assert_eq!(run.state, DriverState::Succeeded);
    assert_eq!(run.outcome, ExecutionOutcome::Completed);
    assert_eq!(run.printed, vec!["hello"]);
    assert!(!run.report_compare_seen);
}

#[test]
fn test_microtasks_run_after_sync_evaluation() {
    let engine = ScriptedEngine::new().script("m.js", |ctx| {
        ctx.queue_microtask(|_| Err(JsError::test262("from a job")));
        Ok(())
    });
    let run = ExecutionDriver::new(&engine, Duration::from_secs(1))
        .execute(&source("m.js", Mode::Strict, false), &Expectation::Complete);
    assert_eq!(run.state, DriverState::Failed);
    assert_eq!(run.verdict.failure().unwrap().kind, FailureKind::Assertion);
}

#[test]
fn test_async_case_completes_from_timer() {
    let engine = ScriptedEngine::new().script("t.js", |ctx| {
        ctx.set_timeout(Duration::from_millis(10), |ctx| {
            ctx.done();
            Ok(())
        });
        Ok(())
    });
    let run = ExecutionDriver::new(&engine, Duration::from_secs(2))
        .execute(&source("t.js", Mode::Sloppy, true), &Expectation::Complete);
    assert_eq!(run.outcome, ExecutionOutcome::CompletedAsync);
    assert!(run.verdict.is_pass());
}

#[test]
fn test_async_rejection() {
    let engine = ScriptedEngine::new().script("r.js", |ctx| {
        ctx.queue_microtask(|ctx| {
            ctx.done_with_error("Test262Error: boom");
            Ok(())
        });
        Ok(())
    });
    let run = ExecutionDriver::new(&engine, Duration::from_secs(1))
        .execute(&source("r.js", Mode::Sloppy, true), &Expectation::Complete);
    let failure = run.verdict.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::AsyncFailure);
    assert_eq!(failure.message, "Test262Error: boom");
}

#[test]
fn test_async_without_done_times_out() {
    let engine = ScriptedEngine::new().script("s.js", |_| Ok(()));
    let run = ExecutionDriver::new(&engine, Duration::from_millis(50))
        .execute(&source("s.js", Mode::Sloppy, true), &Expectation::Complete);
    let failure = run.verdict.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(failure.message, "test timed out after 50ms");
    assert!(run.duration >= Duration::from_millis(50));
}

#[test]
fn test_unknown_program_is_a_host_error() {
    let engine = ScriptedEngine::new();
    let run = ExecutionDriver::new(&engine, Duration::from_secs(1))
        .execute(&source("nope.js", Mode::Sloppy, false), &Expectation::Complete);
    let failure = run.verdict.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Host);
    assert!(failure.message.contains("nope.js"));
}

fn reschedule(ctx: &mut test262_harness::ScriptContext) -> Result<(), JsError> {
    ctx.set_timeout(Duration::ZERO, reschedule);
    Ok(())
}

#[test]
fn test_self_rescheduling_timer_times_out() {
    let engine = ScriptedEngine::new().script("spin.js", |ctx| {
        ctx.set_timeout(Duration::ZERO, reschedule);
        Ok(())
    });
    let run = ExecutionDriver::new(&engine, Duration::from_millis(100))
        .execute(&source("spin.js", Mode::Sloppy, true), &Expectation::Complete);
    let failure = run.verdict.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert!(run.duration < Duration::from_secs(2));
}

#[test]
fn test_self_rescheduling_microtask_in_sync_case_times_out() {
    fn again(ctx: &mut test262_harness::ScriptContext) -> Result<(), JsError> {
        ctx.queue_microtask(again);
        Ok(())
    }
    let engine = ScriptedEngine::new().script("loop.js", |ctx| {
        ctx.queue_microtask(again);
        Ok(())
    });
    let run = ExecutionDriver::new(&engine, Duration::from_millis(100))
        .execute(&source("loop.js", Mode::Sloppy, false), &Expectation::Complete);
    assert_eq!(run.verdict.failure().unwrap().kind, FailureKind::Timeout);
    assert!(run.duration < Duration::from_secs(2));
}

#[test]
fn test_second_done_from_later_timer_is_double_completion() {
    let engine = ScriptedEngine::new().script("late2.js", |ctx| {
        ctx.done();
        ctx.set_timeout(Duration::from_millis(20), |ctx| {
            ctx.done_with_error("second");
            Ok(())
        });
        Ok(())
    });
    let run = ExecutionDriver::new(&engine, Duration::from_secs(2))
        .execute(&source("late2.js", Mode::Sloppy, true), &Expectation::Complete);
    assert_eq!(run.verdict.failure().unwrap().kind, FailureKind::DoubleCompletion);
    assert!(run.duration < Duration::from_secs(1));
}
