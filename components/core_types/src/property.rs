//! Property keys and descriptors.

use crate::value::{SymbolId, Value};
use std::fmt;

/// Key of an own property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String-keyed property (array indices included, in canonical form)
    String(String),
    /// Symbol-keyed property
    Symbol(SymbolId),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Symbol(id) => write!(f, "Symbol(#{})", id.0),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        PropertyKey::String(index.to_string())
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(id: SymbolId) -> Self {
        PropertyKey::Symbol(id)
    }
}

/// A property descriptor with every field optional.
///
/// Descriptors read back from an object are complete (all fields of their
/// flavour present). Partial descriptors express expectations or the
/// argument to a define operation, where absent fields mean "unspecified".
///
/// # Examples
///
/// ```
/// use core_types::{PropertyDescriptor, Value};
///
/// let expected = PropertyDescriptor::new()
///     .with_value(Value::Smi(0))
///     .with_writable(false);
/// assert!(expected.is_data());
/// assert_eq!(expected.enumerable, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDescriptor {
    /// [[Value]]
    pub value: Option<Value>,
    /// [[Writable]]
    pub writable: Option<bool>,
    /// [[Get]]
    pub get: Option<Value>,
    /// [[Set]]
    pub set: Option<Value>,
    /// [[Enumerable]]
    pub enumerable: Option<bool>,
    /// [[Configurable]]
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Creates an empty (fully unspecified) descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a complete data descriptor.
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            get: None,
            set: None,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    /// Creates a complete accessor descriptor.
    pub fn accessor(get: Value, set: Value, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: None,
            writable: None,
            get: Some(get),
            set: Some(set),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    /// Sets [[Value]].
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets [[Writable]].
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    /// Sets [[Enumerable]].
    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    /// Sets [[Configurable]].
    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    /// Sets [[Get]].
    pub fn with_get(mut self, get: Value) -> Self {
        self.get = Some(get);
        self
    }

    /// Sets [[Set]].
    pub fn with_set(mut self, set: Value) -> Self {
        self.set = Some(set);
        self
    }

    /// True when the descriptor has an accessor field.
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// True when the descriptor has a data field.
    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        !self.is_data() && !self.is_accessor() && self.enumerable.is_none() && self.configurable.is_none()
    }
}
