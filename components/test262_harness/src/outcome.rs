//! Execution outcomes and verdicts.
//!
//! The driver records what happened ([`ExecutionOutcome`]); the case's
//! [`Expectation`] turns that into a [`Verdict`].

use crate::test_file::{Phase, TestMetadata};
use core_types::{ErrorKind, JsError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a case did not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// An assertion failed (`Test262Error`)
    Assertion,
    /// Some other error escaped the case
    UncaughtError,
    /// A positive case failed to parse
    UnexpectedParseError,
    /// A negative case raised the wrong error kind
    WrongErrorKind,
    /// A negative case raised its error in another phase
    WrongPhase,
    /// A parse or resolution negative case was accepted
    UnexpectedAcceptance,
    /// A runtime negative case completed normally
    NoThrow,
    /// `$DONE` was called with an error
    AsyncFailure,
    /// The case ran past its deadline
    Timeout,
    /// `$DONE` fired more than once
    DoubleCompletion,
    /// `$DONOTEVALUATE` ran in a parse-phase case
    EvaluatedPastSentinel,
    /// Metadata block present but unparseable
    MalformedMetadata,
    /// No metadata block
    MissingMetadata,
    /// An include is not in the registry
    UnknownInclude,
    /// The engine adapter failed
    Host,
}

impl FailureKind {
    /// Kinds that indicate a harness or protocol problem rather than a
    /// conformance failure; the reporter counts these as errored.
    pub fn is_harness_error(self) -> bool {
        matches!(
            self,
            FailureKind::Timeout
                | FailureKind::DoubleCompletion
                | FailureKind::EvaluatedPastSentinel
                | FailureKind::MalformedMetadata
                | FailureKind::MissingMetadata
                | FailureKind::UnknownInclude
                | FailureKind::Host
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A failure with its message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Failure category
    pub kind: FailureKind,
    /// First failure message
    pub message: String,
}

impl Failure {
    /// Create a failure
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify an uncaught error from a positive case
    pub fn uncaught(error: &JsError) -> Self {
        let kind = if error.kind == ErrorKind::Test262Error {
            FailureKind::Assertion
        } else {
            FailureKind::UncaughtError
        };
        Self::new(kind, error.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// What happened when a variant ran
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Synchronous evaluation returned normally
    Completed,
    /// `$DONE()` fired once
    CompletedAsync,
    /// The driver or protocol failed the case directly
    Failed(Failure),
    /// The engine refused to parse the source
    ParseRejected(JsError),
    /// The source parsed (compile-only run)
    ParseAccepted,
    /// Module linking failed
    ResolutionRejected(JsError),
    /// Evaluation threw
    Threw(JsError),
}

/// What a case expects, derived from its `negative` metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Run to completion
    Complete,
    /// Raise `kind` in `phase`
    Reject {
        /// Phase the error belongs to
        phase: Phase,
        /// Expected constructor
        kind: ErrorKind,
    },
}

impl Expectation {
    /// Derive from metadata
    pub fn from_metadata(metadata: &TestMetadata) -> Self {
        match &metadata.negative {
            None => Expectation::Complete,
            Some(negative) => Expectation::Reject {
                phase: negative.phase,
                kind: ErrorKind::from_name(negative.error_type.trim()),
            },
        }
    }

    /// Whether only compilation should happen
    pub fn is_parse_only(&self) -> bool {
        matches!(
            self,
            Expectation::Reject {
                phase: Phase::Parse,
                ..
            }
        )
    }

    /// Compare an outcome to this expectation
    pub fn judge(&self, outcome: &ExecutionOutcome) -> Verdict {
        use ExecutionOutcome as O;

        match (self, outcome) {
            (_, O::Failed(failure)) => Verdict::Failed(failure.clone()),

            (Expectation::Complete, O::Completed | O::CompletedAsync | O::ParseAccepted) => {
                Verdict::Passed
            }
            (Expectation::Complete, O::ParseRejected(e)) => Verdict::Failed(Failure::new(
                FailureKind::UnexpectedParseError,
                e.to_string(),
            )),
            (Expectation::Complete, O::ResolutionRejected(e) | O::Threw(e)) => {
                Verdict::Failed(Failure::uncaught(e))
            }

            (Expectation::Reject { phase, kind }, outcome) => judge_negative(*phase, kind, outcome),
        }
    }
}

fn judge_negative(phase: Phase, kind: &ErrorKind, outcome: &ExecutionOutcome) -> Verdict {
    use ExecutionOutcome as O;

    let observed = match outcome {
        O::ParseRejected(e) => Some((Phase::Parse, e)),
        O::ResolutionRejected(e) => Some((Phase::Resolution, e)),
        O::Threw(e) => Some((Phase::Runtime, e)),
        _ => None,
    };

    match observed {
        Some((got, error)) if got == phase => {
            if error.kind == *kind {
                Verdict::Passed
            } else {
                Verdict::Failed(Failure::new(
                    FailureKind::WrongErrorKind,
                    format!("Expected {} but got {}", kind, error),
                ))
            }
        }
        Some((got, error)) => Verdict::Failed(Failure::new(
            FailureKind::WrongPhase,
            format!("Expected {} during {} but got {} during {}", kind, phase, error, got),
        )),
        None if phase == Phase::Runtime => Verdict::Failed(Failure::new(
            FailureKind::NoThrow,
            format!("Expected {} to be thrown but evaluation completed normally", kind),
        )),
        None => Verdict::Failed(Failure::new(
            FailureKind::UnexpectedAcceptance,
            format!("Expected {} during {} but the source was accepted", kind, phase),
        )),
    }
}

/// Final result of one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Passed
    Passed,
    /// Failed, with the first failure
    Failed(Failure),
    /// Not run, with the reason
    Skipped(String),
}

impl Verdict {
    /// Check if the verdict is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    /// Check if the verdict is a failure
    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }

    /// Check if the verdict is a skip
    pub fn is_skip(&self) -> bool {
        matches!(self, Verdict::Skipped(_))
    }

    /// The failure, if any
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Verdict::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}
