//! Error kinds observed from an engine under test.
//!
//! Negative tests declare the error constructor they expect by name
//! (`negative.type: SyntaxError`), so kinds convert to and from their
//! constructor names exactly.

use crate::SourcePosition;
use std::fmt;
use std::str::FromStr;

/// The kind of a thrown error, named after its constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Syntax error, usually raised at parse time
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an unresolvable binding
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Error in eval()
    EvalError,
    /// Error in URI handling functions
    URIError,
    /// Several errors at once (Promise.any)
    AggregateError,
    /// Failure raised by the harness assertion library
    Test262Error,
    /// Plain `Error` instances
    Error,
    /// Any other constructor name the engine reported
    Other(String),
}

impl ErrorKind {
    /// Returns the constructor name of this kind.
    pub fn name(&self) -> &str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::URIError => "URIError",
            ErrorKind::AggregateError => "AggregateError",
            ErrorKind::Test262Error => "Test262Error",
            ErrorKind::Error => "Error",
            ErrorKind::Other(name) => name,
        }
    }

    /// Maps a constructor name to a kind. Unknown names become `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "SyntaxError" => ErrorKind::SyntaxError,
            "TypeError" => ErrorKind::TypeError,
            "ReferenceError" => ErrorKind::ReferenceError,
            "RangeError" => ErrorKind::RangeError,
            "EvalError" => ErrorKind::EvalError,
            "URIError" => ErrorKind::URIError,
            "AggregateError" => ErrorKind::AggregateError,
            "Test262Error" => ErrorKind::Test262Error,
            "Error" => ErrorKind::Error,
            other => ErrorKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ErrorKind::from_name(s.trim()))
    }
}

/// An error value thrown by script or raised by the engine.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError};
///
/// let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Where the engine reported the error, when known
    pub source_position: Option<SourcePosition>,
}

impl JsError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_position: None,
        }
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates a `SyntaxError`.
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    /// Creates a `Test262Error`, the kind assertion failures surface as.
    pub fn test262(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Test262Error, message)
    }

    /// Attaches the position the engine reported.
    pub fn at(mut self, position: SourcePosition) -> Self {
        self.source_position = Some(position);
        self
    }
}
