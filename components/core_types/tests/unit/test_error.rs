//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, SourcePosition};

mod error_kind_tests {
    use super::*;

    #[test]
    fn names_match_constructors() {
        assert_eq!(ErrorKind::SyntaxError.name(), "SyntaxError");
        assert_eq!(ErrorKind::URIError.name(), "URIError");
        assert_eq!(ErrorKind::Test262Error.name(), "Test262Error");
    }

    #[test]
    fn from_name_is_exact() {
        assert_eq!(ErrorKind::from_name("TypeError"), ErrorKind::TypeError);
        // Lookalikes are not folded into known kinds.
        assert_eq!(
            ErrorKind::from_name("typeerror"),
            ErrorKind::Other("typeerror".to_string())
        );
    }

    #[test]
    fn parse_trims_whitespace() {
        let kind: ErrorKind = " ReferenceError ".parse().unwrap();
        assert_eq!(kind, ErrorKind::ReferenceError);
    }
}

mod js_error_tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        assert_eq!(JsError::type_error("x").kind, ErrorKind::TypeError);
        assert_eq!(JsError::syntax_error("x").kind, ErrorKind::SyntaxError);
        assert_eq!(JsError::test262("x").kind, ErrorKind::Test262Error);
    }

    #[test]
    fn position_is_attached() {
        let error = JsError::syntax_error("bad").at(SourcePosition { line: 4, column: 2 });
        assert_eq!(error.source_position, Some(SourcePosition { line: 4, column: 2 }));
        assert_eq!(error.to_string(), "SyntaxError: bad");
    }

    #[test]
    fn implements_std_error() {
        let error: Box<dyn std::error::Error> = Box::new(JsError::type_error("oops"));
        assert_eq!(error.to_string(), "TypeError: oops");
    }
}
