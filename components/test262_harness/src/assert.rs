//! Assertion library.
//!
//! Host-side counterparts of `assert.js`, `compareArray.js` and
//! `propertyHelper.js`. Every assertion returns `Result<(), AssertionFailure>`;
//! inside a realm a failure surfaces as an uncaught `Test262Error` carrying
//! the same message the JavaScript helpers would produce.

use core_types::{ErrorKind, JsError, ObjectId, PropertyDescriptor, PropertyKey, Value};

/// Object operations the property assertions need.
///
/// The sandbox heap implements this; an engine adapter may implement it over
/// its own object model.
pub trait ObjectAccess {
    /// [[GetOwnProperty]], returning a complete descriptor
    fn get_own_property(&self, object: ObjectId, key: &PropertyKey) -> Option<PropertyDescriptor>;

    /// [[Get]] with `object` as receiver
    fn get(&self, object: ObjectId, key: &PropertyKey) -> Result<Value, JsError>;

    /// `object[key] = value`; in strict code a failed write throws `TypeError`
    fn set(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        value: Value,
        strict: bool,
    ) -> Result<bool, JsError>;

    /// `delete object[key]`; in strict code a failed delete throws `TypeError`
    fn delete(&mut self, object: ObjectId, key: &PropertyKey, strict: bool)
        -> Result<bool, JsError>;

    /// [[DefineOwnProperty]]
    fn define_own_property(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> Result<bool, JsError>;
}

/// A failed assertion
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssertionFailure {
    /// `assert.sameValue`
    #[error("{}Expected SameValue(«{actual}», «{expected}») to be true", prefix(.message))]
    NotSameValue {
        /// Rendered actual value
        actual: String,
        /// Rendered expected value
        expected: String,
        /// Caller's message
        message: Option<String>,
    },

    /// `assert.notSameValue`
    #[error("{}Expected «{actual}» and «{unexpected}» to be different", prefix(.message))]
    UnexpectedSameValue {
        /// Rendered actual value
        actual: String,
        /// Rendered unexpected value
        unexpected: String,
        /// Caller's message
        message: Option<String>,
    },

    /// `assert(value)`
    #[error("{}", not_true(.actual, .message))]
    NotTrue {
        /// Rendered value
        actual: String,
        /// Caller's message
        message: Option<String>,
    },

    /// `assert.throws` where nothing was thrown
    #[error("{}Expected a {expected} to be thrown but no exception was thrown at all", prefix(.message))]
    NoThrow {
        /// Expected constructor
        expected: ErrorKind,
        /// Caller's message
        message: Option<String>,
    },

    /// `assert.throws` where another kind was thrown
    #[error("{}Expected a {expected} but got a {actual}", prefix(.message))]
    WrongErrorKind {
        /// Expected constructor
        expected: ErrorKind,
        /// Constructor actually thrown
        actual: ErrorKind,
        /// Caller's message
        message: Option<String>,
    },

    /// `assert.compareArray`
    #[error("Actual [{}] and expected [{}] should have the same contents. {}", .actual.join(", "), .expected.join(", "), .message.as_deref().unwrap_or(""))]
    ArrayMismatch {
        /// Rendered actual elements
        actual: Vec<String>,
        /// Rendered expected elements
        expected: Vec<String>,
        /// Caller's message
        message: Option<String>,
    },

    /// `verifyProperty` and friends; lists every mismatch found
    #[error("{}", .failures.join("; "))]
    Property {
        /// Property checked
        name: String,
        /// One entry per mismatched attribute
        failures: Vec<String>,
    },
}

fn prefix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!("{} ", m),
        _ => String::new(),
    }
}

fn not_true(actual: &str, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("Expected true but got {}", actual),
    }
}

impl From<AssertionFailure> for JsError {
    fn from(failure: AssertionFailure) -> Self {
        JsError::test262(failure.to_string())
    }
}

/// `assert.sameValue(actual, expected, message)`
pub fn same_value(
    actual: &Value,
    expected: &Value,
    message: Option<&str>,
) -> Result<(), AssertionFailure> {
    if actual.same_value(expected) {
        return Ok(());
    }
    Err(AssertionFailure::NotSameValue {
        actual: actual.to_diagnostic(),
        expected: expected.to_diagnostic(),
        message: message.map(str::to_string),
    })
}

/// `assert.notSameValue(actual, unexpected, message)`
pub fn not_same_value(
    actual: &Value,
    unexpected: &Value,
    message: Option<&str>,
) -> Result<(), AssertionFailure> {
    if !actual.same_value(unexpected) {
        return Ok(());
    }
    Err(AssertionFailure::UnexpectedSameValue {
        actual: actual.to_diagnostic(),
        unexpected: unexpected.to_diagnostic(),
        message: message.map(str::to_string),
    })
}

/// `assert(value, message)`: passes only for `true` itself
pub fn assert_true(value: &Value, message: Option<&str>) -> Result<(), AssertionFailure> {
    if *value == Value::Boolean(true) {
        return Ok(());
    }
    Err(AssertionFailure::NotTrue {
        actual: value.to_string(),
        message: message.map(str::to_string),
    })
}

/// `assert.throws(kind, thunk, message)`
pub fn throws<F>(expected: ErrorKind, thunk: F, message: Option<&str>) -> Result<(), AssertionFailure>
where
    F: FnOnce() -> Result<(), JsError>,
{
    match thunk() {
        Ok(()) => Err(AssertionFailure::NoThrow {
            expected,
            message: message.map(str::to_string),
        }),
        Err(error) if error.kind == expected => Ok(()),
        Err(error) => Err(AssertionFailure::WrongErrorKind {
            expected,
            actual: error.kind,
            message: message.map(str::to_string),
        }),
    }
}

/// `assert.compareArray(actual, expected, message)`: element-wise SameValue
pub fn compare_array(
    actual: &[Value],
    expected: &[Value],
    message: Option<&str>,
) -> Result<(), AssertionFailure> {
    let equal = actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(a, e)| a.same_value(e));
    if equal {
        return Ok(());
    }
    Err(AssertionFailure::ArrayMismatch {
        actual: actual.iter().map(Value::to_diagnostic).collect(),
        expected: expected.iter().map(Value::to_diagnostic).collect(),
        message: message.map(str::to_string),
    })
}

/// Options for [`verify_property`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Leave the property in place after a successful check
    pub restore: bool,
}

fn flag_check(
    failures: &mut Vec<String>,
    name: &str,
    attr: &str,
    expected: Option<bool>,
    actual: Option<bool>,
) {
    if let Some(expected) = expected {
        let actual = actual.unwrap_or(false);
        if expected != actual {
            let not = if expected { "" } else { "not " };
            failures.push(format!("{} descriptor should {}be {}", name, not, attr));
        }
    }
}

fn value_check(
    failures: &mut Vec<String>,
    name: &str,
    attr: &str,
    expected: &Option<Value>,
    actual: &Option<Value>,
) {
    if let Some(expected) = expected {
        let actual = actual.clone().unwrap_or(Value::Undefined);
        if !actual.same_value(expected) {
            failures.push(format!(
                "{} descriptor {} should be {} (got {})",
                name,
                attr,
                expected.to_diagnostic(),
                actual.to_diagnostic()
            ));
        }
    }
}

/// `verifyProperty(obj, name, desc, options)`.
///
/// Compares every attribute present in `expected` with the actual own
/// descriptor and reports all mismatches together. On success a
/// configurable property is deleted unless `options.restore` is set.
pub fn verify_property<A: ObjectAccess + ?Sized>(
    access: &mut A,
    object: ObjectId,
    key: &PropertyKey,
    expected: &PropertyDescriptor,
    options: VerifyOptions,
) -> Result<(), AssertionFailure> {
    let name = format!("obj['{}']", key);
    let Some(actual) = access.get_own_property(object, key) else {
        return Err(AssertionFailure::Property {
            failures: vec![format!("obj should have an own property {}", key)],
            name,
        });
    };

    let mut failures = Vec::new();
    value_check(&mut failures, &name, "value", &expected.value, &actual.value);
    value_check(&mut failures, &name, "getter", &expected.get, &actual.get);
    value_check(&mut failures, &name, "setter", &expected.set, &actual.set);
    flag_check(&mut failures, &name, "writable", expected.writable, actual.writable);
    flag_check(&mut failures, &name, "enumerable", expected.enumerable, actual.enumerable);
    flag_check(&mut failures, &name, "configurable", expected.configurable, actual.configurable);

    if !failures.is_empty() {
        return Err(AssertionFailure::Property { name, failures });
    }

    if !options.restore && actual.configurable == Some(true) {
        match access.delete(object, key, false) {
            Ok(true) if access.get_own_property(object, key).is_none() => {}
            Ok(_) => failures.push(format!(
                "{} descriptor should be configurable but could not be deleted",
                name
            )),
            Err(e) => failures.push(format!("deleting {} threw {}", name, e)),
        }
        if !failures.is_empty() {
            return Err(AssertionFailure::Property { name, failures });
        }
    }
    Ok(())
}

/// Value written by [`verify_not_writable`]
pub const UNLIKELY_VALUE: &str = "unlikelyValue";

/// `verifyNotWritable`: a write must fail without changing the value.
///
/// Sloppy code must ignore the write silently; strict code must throw a
/// `TypeError`.
pub fn verify_not_writable<A: ObjectAccess + ?Sized>(
    access: &mut A,
    object: ObjectId,
    key: &PropertyKey,
    strict: bool,
) -> Result<(), AssertionFailure> {
    let name = format!("obj['{}']", key);
    let before = access.get(object, key).unwrap_or(Value::Undefined);
    let mut failures = Vec::new();

    match access.set(object, key, Value::string(UNLIKELY_VALUE), strict) {
        Ok(_) if strict => failures.push(format!(
            "Expected a TypeError when writing {} in strict mode",
            name
        )),
        Ok(_) => {}
        Err(error) if strict && error.kind == ErrorKind::TypeError => {}
        Err(error) => failures.push(format!("writing {} threw {}", name, error)),
    }

    let after = access.get(object, key).unwrap_or(Value::Undefined);
    if !after.same_value(&before) {
        failures.push(format!(
            "{} descriptor should not be writable (value changed to {})",
            name,
            after.to_diagnostic()
        ));
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(AssertionFailure::Property { name, failures })
    }
}

/// `verifyNotEnumerable`
pub fn verify_not_enumerable<A: ObjectAccess + ?Sized>(
    access: &mut A,
    object: ObjectId,
    key: &PropertyKey,
) -> Result<(), AssertionFailure> {
    verify_property(
        access,
        object,
        key,
        &PropertyDescriptor::new().with_enumerable(false),
        VerifyOptions { restore: true },
    )
}

/// `verifyNotConfigurable`
pub fn verify_not_configurable<A: ObjectAccess + ?Sized>(
    access: &mut A,
    object: ObjectId,
    key: &PropertyKey,
) -> Result<(), AssertionFailure> {
    verify_property(
        access,
        object,
        key,
        &PropertyDescriptor::new().with_configurable(false),
        VerifyOptions { restore: true },
    )
}
