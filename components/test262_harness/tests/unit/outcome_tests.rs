//! Unit tests for outcome judgement

use core_types::{ErrorKind, JsError};
use test262_harness::{ExecutionOutcome, Expectation, Failure, FailureKind, Phase, Verdict};

fn reject(phase: Phase, kind: ErrorKind) -> Expectation {
    Expectation::Reject { phase, kind }
}

fn kind_of(verdict: Verdict) -> FailureKind {
    verdict.failure().map(|f| f.kind).expect("expected a failure")
}

#[test]
fn test_positive_expectation() {
    let expect = Expectation::Complete;
    assert!(expect.judge(&ExecutionOutcome::Completed).is_pass());
    assert!(expect.judge(&ExecutionOutcome::CompletedAsync).is_pass());
    assert_eq!(
        kind_of(expect.judge(&ExecutionOutcome::Threw(JsError::test262("x")))),
        FailureKind::Assertion
    );
    assert_eq!(
        kind_of(expect.judge(&ExecutionOutcome::Threw(JsError::type_error("x")))),
        FailureKind::UncaughtError
    );
    assert_eq!(
        kind_of(expect.judge(&ExecutionOutcome::ParseRejected(JsError::syntax_error("x")))),
        FailureKind::UnexpectedParseError
    );
}

#[test]
fn test_direct_failures_pass_through() {
    let failure = Failure::new(FailureKind::Timeout, "late");
    let outcome = ExecutionOutcome::Failed(failure.clone());
    assert_eq!(Expectation::Complete.judge(&outcome), Verdict::Failed(failure.clone()));
    assert_eq!(
        reject(Phase::Runtime, ErrorKind::TypeError).judge(&outcome),
        Verdict::Failed(failure)
    );
}

#[test]
fn test_negative_matching_phase_and_kind() {
    let expect = reject(Phase::Parse, ErrorKind::SyntaxError);
    assert!(expect.is_parse_only());
    assert!(expect
        .judge(&ExecutionOutcome::ParseRejected(JsError::syntax_error("x")))
        .is_pass());

    let expect = reject(Phase::Resolution, ErrorKind::SyntaxError);
    assert!(!expect.is_parse_only());
    assert!(expect
        .judge(&ExecutionOutcome::ResolutionRejected(JsError::syntax_error("x")))
        .is_pass());
}

#[test]
fn test_negative_wrong_kind() {
    let expect = reject(Phase::Runtime, ErrorKind::TypeError);
    let verdict = expect.judge(&ExecutionOutcome::Threw(JsError::new(ErrorKind::RangeError, "r")));
    let failure = verdict.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::WrongErrorKind);
    assert!(failure.message.starts_with("Expected TypeError but got RangeError"));
}

#[test]
fn test_negative_wrong_phase() {
    let expect = reject(Phase::Parse, ErrorKind::SyntaxError);
    assert_eq!(
        kind_of(expect.judge(&ExecutionOutcome::Threw(JsError::syntax_error("x")))),
        FailureKind::WrongPhase
    );
}

#[test]
fn test_negative_without_error() {
    assert_eq!(
        kind_of(reject(Phase::Runtime, ErrorKind::TypeError).judge(&ExecutionOutcome::Completed)),
        FailureKind::NoThrow
    );
    assert_eq!(
        kind_of(
            reject(Phase::Parse, ErrorKind::SyntaxError).judge(&ExecutionOutcome::ParseAccepted)
        ),
        FailureKind::UnexpectedAcceptance
    );
    assert_eq!(
        kind_of(
            reject(Phase::Resolution, ErrorKind::SyntaxError).judge(&ExecutionOutcome::Completed)
        ),
        FailureKind::UnexpectedAcceptance
    );
}

#[test]
fn test_expectation_from_metadata() {
    let metadata = test262_harness::TestMetadata::parse(
        "/*---\nnegative:\n  phase: runtime\n  type: Test262Error\n---*/\n",
    )
    .unwrap();
    assert_eq!(
        Expectation::from_metadata(&metadata),
        reject(Phase::Runtime, ErrorKind::Test262Error)
    );
}
