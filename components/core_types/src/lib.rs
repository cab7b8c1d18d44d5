//! Host-side value model shared by the conformance harness crates.
//!
//! The harness treats the engine under test as a black box; this crate holds
//! the little it needs to reason about what the engine reports back.
//!
//! # Overview
//!
//! - [`Value`] - Values with the SameValue comparison
//! - [`JsError`] / [`ErrorKind`] - Thrown errors, named by constructor
//! - [`PropertyKey`] / [`PropertyDescriptor`] - Property attributes
//! - [`SourcePosition`] - Error locations
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, Value};
//!
//! assert!(Value::Double(f64::NAN).same_value(&Value::Double(f64::NAN)));
//!
//! let error = JsError::new(ErrorKind::from_name("SyntaxError"), "bad token");
//! assert_eq!(error.kind, ErrorKind::SyntaxError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod property;
mod source;
mod value;

pub use error::{ErrorKind, JsError};
pub use property::{PropertyDescriptor, PropertyKey};
pub use source::SourcePosition;
pub use value::{ObjectId, SymbolId, Value};
