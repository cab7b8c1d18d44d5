//! Per-realm host hooks.
//!
//! The harness hands a [`HostHooks`] bundle to the engine when it creates a
//! realm. Clones share state, so the driver keeps one handle and inspects
//! what the case did after the engine is finished with it.

use crate::assert;
use async_runtime::{CompletionCell, CompletionError};
use core_types::{JsError, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Message thrown by `$DONOTEVALUATE()`
pub const DO_NOT_EVALUATE_MESSAGE: &str = "Test262: This statement should not be evaluated.";

#[derive(Debug, Default)]
struct Shared {
    sentinel_hits: AtomicUsize,
    report_compare_calls: AtomicUsize,
    printed: Mutex<Vec<String>>,
}

/// Host functions a case can reach: `$DONE`, `$DONOTEVALUATE`,
/// `reportCompare` and `print`.
#[derive(Debug, Clone, Default)]
pub struct HostHooks {
    completion: CompletionCell,
    shared: Arc<Shared>,
}

impl HostHooks {
    /// Fresh hooks with an empty completion cell
    pub fn new() -> Self {
        Self::default()
    }

    /// The completion cell behind `$DONE`
    pub fn completion(&self) -> &CompletionCell {
        &self.completion
    }

    /// `$DONE()` / `$DONE(error)`
    pub fn done(&self, error: Option<&str>) -> Result<(), CompletionError> {
        match error {
            None => self.completion.resolve(),
            Some(message) => self.completion.reject(message),
        }
    }

    /// `$DONOTEVALUATE()`: records the hit and returns the error to throw
    pub fn do_not_evaluate(&self) -> JsError {
        self.shared.sentinel_hits.fetch_add(1, Ordering::SeqCst);
        JsError::test262(DO_NOT_EVALUATE_MESSAGE)
    }

    /// Whether `$DONOTEVALUATE()` ran
    pub fn sentinel_tripped(&self) -> bool {
        self.shared.sentinel_hits.load(Ordering::SeqCst) > 0
    }

    /// `reportCompare(expected, actual, message)`
    pub fn report_compare(
        &self,
        expected: &Value,
        actual: &Value,
        message: Option<&str>,
    ) -> Result<(), JsError> {
        self.mark_report_compare();
        assert::same_value(actual, expected, message).map_err(JsError::from)
    }

    /// Records a `reportCompare` call observed out of process
    pub fn mark_report_compare(&self) {
        self.shared.report_compare_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether `reportCompare` was called at least once
    pub fn report_compare_seen(&self) -> bool {
        self.shared.report_compare_calls.load(Ordering::SeqCst) > 0
    }

    /// `print(line)`
    pub fn print(&self, line: impl Into<String>) {
        self.shared.printed.lock().push(line.into());
    }

    /// Everything printed so far
    pub fn printed(&self) -> Vec<String> {
        self.shared.printed.lock().clone()
    }
}
