//! Execution driver.
//!
//! Runs one variant of one case in a fresh realm and produces its verdict.
//! The driver walks a small state machine:
//!
//! ```text
//! Pending ─┬─> RunningSync  ─┬─> Succeeded
//!          └─> RunningAsync ─┘─> Failed
//! ```

use crate::engine::{Engine, EvalFailure, JobStatus, Realm, Source};
use crate::host::HostHooks;
use crate::outcome::{ExecutionOutcome, Expectation, Failure, FailureKind, Verdict};
use async_runtime::{Completion, CompletionCell, CompletionError};
use std::fmt;
use std::time::{Duration, Instant};

// Upper bound on one wait while the realm still has timers pending.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Not started
    Pending,
    /// Evaluating a synchronous case or compiling a parse-phase case
    RunningSync,
    /// Waiting for `$DONE`
    RunningAsync,
    /// Finished with a passing verdict
    Succeeded,
    /// Finished with a failing verdict
    Failed,
}

impl DriverState {
    fn can_move_to(self, next: DriverState) -> bool {
        use DriverState::*;
        matches!(
            (self, next),
            (Pending, RunningSync | RunningAsync | Failed)
                | (RunningSync | RunningAsync, Succeeded | Failed)
        )
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything recorded about one variant run
#[derive(Debug, Clone)]
pub struct CaseRun {
    /// Terminal driver state
    pub state: DriverState,
    /// What happened
    pub outcome: ExecutionOutcome,
    /// Judged against the expectation
    pub verdict: Verdict,
    /// Whether `reportCompare` was called
    pub report_compare_seen: bool,
    /// Captured `print` output
    pub printed: Vec<String>,
    /// Wall time
    pub duration: Duration,
}

/// Runs a single variant against an engine
pub struct ExecutionDriver<'e, E: Engine> {
    engine: &'e E,
    timeout: Duration,
    state: DriverState,
}

impl<'e, E: Engine> ExecutionDriver<'e, E> {
    /// Create a driver with a per-variant timeout
    pub fn new(engine: &'e E, timeout: Duration) -> Self {
        Self {
            engine,
            timeout,
            state: DriverState::Pending,
        }
    }

    /// Current state
    pub fn state(&self) -> DriverState {
        self.state
    }

    fn transition(&mut self, next: DriverState) {
        debug_assert!(
            self.state.can_move_to(next),
            "invalid driver transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(from = %self.state, to = %next, "driver transition");
        self.state = next;
    }

    /// Run `source` in a fresh realm and judge it against `expectation`
    pub fn execute(mut self, source: &Source, expectation: &Expectation) -> CaseRun {
        let span = tracing::debug_span!("case", id = %source.case_id, mode = %source.mode);
        let _enter = span.enter();

        let start = Instant::now();
        let deadline = start + self.timeout;
        let hooks = HostHooks::new();

        let outcome = match self.engine.create_realm(hooks.clone()) {
            Ok(mut realm) => {
                if expectation.is_parse_only() {
                    self.transition(DriverState::RunningSync);
                    self.run_parse(&mut realm, &hooks, source, deadline)
                } else if source.is_async {
                    self.transition(DriverState::RunningAsync);
                    self.run_async(&mut realm, &hooks, source, deadline)
                } else {
                    self.transition(DriverState::RunningSync);
                    self.run_sync(&mut realm, source, deadline)
                }
            }
            Err(e) => ExecutionOutcome::Failed(Failure::new(FailureKind::Host, e.to_string())),
        };

        let verdict = expectation.judge(&outcome);
        self.transition(if verdict.is_pass() {
            DriverState::Succeeded
        } else {
            DriverState::Failed
        });
        let duration = start.elapsed();
        tracing::debug!(?verdict, elapsed_ms = duration.as_millis() as u64, "case finished");

        CaseRun {
            state: self.state,
            outcome,
            verdict,
            report_compare_seen: hooks.report_compare_seen(),
            printed: hooks.printed(),
            duration,
        }
    }

    fn classify(&self, failure: EvalFailure) -> ExecutionOutcome {
        match failure {
            EvalFailure::Parse(e) => ExecutionOutcome::ParseRejected(e),
            EvalFailure::Resolution(e) => ExecutionOutcome::ResolutionRejected(e),
            EvalFailure::Thrown(e) => ExecutionOutcome::Threw(e),
            EvalFailure::DeadlineExceeded => self.timed_out(),
            EvalFailure::Host(message) => {
                ExecutionOutcome::Failed(Failure::new(FailureKind::Host, message))
            }
        }
    }

    fn timed_out(&self) -> ExecutionOutcome {
        ExecutionOutcome::Failed(Failure::new(
            FailureKind::Timeout,
            format!("test timed out after {}ms", self.timeout.as_millis()),
        ))
    }

    fn run_parse(
        &self,
        realm: &mut E::Realm,
        hooks: &HostHooks,
        source: &Source,
        deadline: Instant,
    ) -> ExecutionOutcome {
        let result = realm.compile(source, deadline);
        if hooks.sentinel_tripped() {
            return ExecutionOutcome::Failed(Failure::new(
                FailureKind::EvaluatedPastSentinel,
                "$DONOTEVALUATE was reached while only parsing",
            ));
        }
        match result {
            Ok(()) => ExecutionOutcome::ParseAccepted,
            Err(failure) => self.classify(failure),
        }
    }

    fn run_sync(&self, realm: &mut E::Realm, source: &Source, deadline: Instant) -> ExecutionOutcome {
        if let Err(failure) = realm.evaluate(source, deadline) {
            return self.classify(failure);
        }
        match realm.run_jobs(deadline) {
            Ok(JobStatus::Pending) if Instant::now() >= deadline => self.timed_out(),
            Ok(_) => ExecutionOutcome::Completed,
            Err(failure) => self.classify(failure),
        }
    }

    fn run_async(
        &self,
        realm: &mut E::Realm,
        hooks: &HostHooks,
        source: &Source,
        deadline: Instant,
    ) -> ExecutionOutcome {
        if let Err(failure) = realm.evaluate(source, deadline) {
            return self.classify(failure);
        }

        let cell = hooks.completion();
        while !cell.is_settled() {
            let now = Instant::now();
            if now >= deadline {
                if cell.close() {
                    tracing::debug!("closed completion cell at deadline");
                    return self.timed_out();
                }
                break;
            }
            match realm.run_jobs(deadline) {
                Err(failure) => return self.classify(failure),
                Ok(JobStatus::Pending) => {
                    cell.wait_until((now + POLL_INTERVAL).min(deadline));
                }
                Ok(JobStatus::Idle) => {
                    cell.wait_until(deadline);
                }
                Ok(JobStatus::Exhausted) => {
                    if cell.close() {
                        return ExecutionOutcome::Failed(Failure::new(
                            FailureKind::Timeout,
                            "engine finished without signalling completion",
                        ));
                    }
                    break;
                }
            }
        }

        if let Err(failure) = self.drain_after_settlement(realm, cell, deadline) {
            return self.classify(failure);
        }

        let Some(completion) = cell.completion() else {
            return self.timed_out();
        };
        if let Some(second) = cell.repeated_signals().first() {
            let error = CompletionError::AlreadyCompleted {
                first: completion.channel(),
                second: *second,
            };
            return ExecutionOutcome::Failed(Failure::new(
                FailureKind::DoubleCompletion,
                error.to_string(),
            ));
        }
        match completion {
            Completion::Resolved => ExecutionOutcome::CompletedAsync,
            Completion::Rejected(message) => {
                ExecutionOutcome::Failed(Failure::new(FailureKind::AsyncFailure, message))
            }
        }
    }

    /// Keep running the realm's jobs after `$DONE` so that a second signal
    /// from a pending timer is seen. Stops at the first repeated signal, once
    /// nothing is left to run, or at the deadline.
    fn drain_after_settlement(
        &self,
        realm: &mut E::Realm,
        cell: &CompletionCell,
        deadline: Instant,
    ) -> Result<(), EvalFailure> {
        while cell.repeated_signals().is_empty() {
            if Instant::now() >= deadline {
                break;
            }
            match realm.run_jobs(deadline)? {
                JobStatus::Pending => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    std::thread::sleep(remaining.min(POLL_INTERVAL));
                }
                JobStatus::Idle | JobStatus::Exhausted => break,
            }
        }
        Ok(())
    }
}
