//! Host-side representation of ECMAScript values.
//!
//! The harness never evaluates script itself; it only needs to hold the
//! values an engine hands back (assertion operands, property values) and
//! compare them with the language's SameValue algorithm.

use num_bigint::BigInt;
use num_traits::Zero;
use std::fmt;

/// Index of an object inside a realm's heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// Identity of a symbol value. Symbols compare by identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Represents any ECMAScript value observed by the harness.
///
/// Numbers come in two representations, mirroring what engines expose:
/// small integers (`Smi`) and IEEE 754 doubles. Both denote the same
/// Number type, so `Smi(1)` and `Double(1.0)` are the same value.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert!(Value::Double(f64::NAN).same_value(&Value::Double(f64::NAN)));
/// assert!(!Value::Double(0.0).same_value(&Value::Double(-0.0)));
/// assert!(Value::Smi(7).same_value(&Value::Double(7.0)));
/// ```
#[derive(Clone)]
pub enum Value {
    /// The undefined value
    Undefined,
    /// The null value
    Null,
    /// true or false
    Boolean(bool),
    /// Small integer representation of a Number
    Smi(i32),
    /// Double-precision representation of a Number
    Double(f64),
    /// String value
    String(String),
    /// BigInt value
    BigInt(BigInt),
    /// Symbol value, by identity
    Symbol(SymbolId),
    /// Reference to an object in the owning realm's heap
    Object(ObjectId),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
            Value::Symbol(id) => f.debug_tuple("Symbol").field(&id.0).finish(),
            Value::Object(id) => f.debug_tuple("Object").field(&id.0).finish(),
        }
    }
}

/// Structural equality for Rust collections and test assertions.
///
/// Doubles compare with IEEE semantics here (`NaN != NaN`, `0.0 == -0.0`);
/// use [`Value::same_value`] for language semantics.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Creates a number value, using the integer representation when exact.
    ///
    /// `-0.0` always stays a double so its sign survives.
    pub fn number(n: f64) -> Self {
        let is_exact_int = n.fract() == 0.0
            && n >= i32::MIN as f64
            && n <= i32::MAX as f64
            && !(n == 0.0 && n.is_sign_negative());
        if is_exact_int {
            Value::Smi(n as i32)
        } else {
            Value::Double(n)
        }
    }

    /// Returns the numeric value if this is a Number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Smi(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the object id if this is an object reference.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns true for `undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// The SameValue algorithm.
    ///
    /// Unlike `===`, NaN is the same as NaN and `+0` is not the same as `-0`.
    pub fn same_value(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            if a.is_nan() && b.is_nan() {
                return true;
            }
            return a == b && a.is_sign_negative() == b.is_sign_negative();
        }
        self == other
    }

    /// Returns whether this value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::BigInt(n) => !n.is_zero(),
            Value::Symbol(_) | Value::Object(_) => true,
        }
    }

    /// Returns the `typeof` result for this value.
    ///
    /// Callability lives in the heap, so objects always report "object".
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Symbol(_) => "symbol",
            Value::Object(_) => "object",
        }
    }

    /// Renders the value for assertion messages.
    ///
    /// Strings are quoted and `-0` keeps its sign so that failures such as
    /// `Expected SameValue(«0», «-0»)` are readable.
    pub fn to_diagnostic(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s),
            Value::Double(n) if *n == 0.0 && n.is_sign_negative() => "-0".to_string(),
            Value::Symbol(id) => format!("Symbol(#{})", id.0),
            Value::Object(id) => format!("[object #{}]", id.0),
            other => other.to_string(),
        }
    }
}

/// String conversion following `String(value)` for primitives.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Double(-0.0).to_string(), "0");
/// assert_eq!(Value::Double(1.5).to_string(), "1.5");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::BigInt(n) => write!(f, "{}", n),
            Value::Symbol(_) => write!(f, "Symbol()"),
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}
