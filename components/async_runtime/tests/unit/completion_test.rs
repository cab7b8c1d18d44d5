//! Unit tests for CompletionCell

use async_runtime::{CellState, Channel, Completion, CompletionCell, CompletionError};
use std::time::{Duration, Instant};

#[test]
fn new_cell_is_empty() {
    let cell = CompletionCell::new();
    assert_eq!(cell.state(), CellState::Empty);
    assert!(!cell.is_settled());
    assert_eq!(cell.completion(), None);
}

#[test]
fn resolve_settles_success_channel() {
    let cell = CompletionCell::new();
    cell.resolve().unwrap();
    assert_eq!(cell.completion(), Some(Completion::Resolved));
}

#[test]
fn reject_keeps_message() {
    let cell = CompletionCell::new();
    cell.reject("Test262Error: nope").unwrap();
    assert_eq!(
        cell.state(),
        CellState::Settled(Completion::Rejected("Test262Error: nope".to_string()))
    );
}

#[test]
fn second_signal_on_same_channel_is_a_violation() {
    let cell = CompletionCell::new();
    cell.resolve().unwrap();
    let err = cell.resolve().unwrap_err();
    assert_eq!(
        err,
        CompletionError::AlreadyCompleted {
            first: Channel::Success,
            second: Channel::Success,
        }
    );
    assert_eq!(cell.repeated_signals(), vec![Channel::Success]);
}

#[test]
fn signal_on_other_channel_after_settle_is_a_violation() {
    let cell = CompletionCell::new();
    cell.resolve().unwrap();
    assert!(cell.reject("late").is_err());
    assert_eq!(cell.completion(), Some(Completion::Resolved));
    assert_eq!(cell.repeated_signals(), vec![Channel::Failure]);
}

#[test]
fn closed_cell_ignores_signals_without_counting_repeats() {
    let cell = CompletionCell::new();
    cell.close();
    assert_eq!(cell.reject("x"), Err(CompletionError::Closed(Channel::Failure)));
    assert!(cell.repeated_signals().is_empty());
    assert_eq!(cell.late_signals(), vec![Channel::Failure]);
    assert_eq!(cell.state(), CellState::Closed);
}

#[test]
fn clones_share_state() {
    let cell = CompletionCell::new();
    let handle = cell.clone();
    handle.resolve().unwrap();
    assert!(cell.is_settled());
}

#[test]
fn wait_returns_immediately_when_settled() {
    let cell = CompletionCell::new();
    cell.resolve().unwrap();
    let start = Instant::now();
    let state = cell.wait_until(start + Duration::from_secs(10));
    assert_eq!(state, CellState::Settled(Completion::Resolved));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn error_messages_name_channels() {
    let err = CompletionError::AlreadyCompleted {
        first: Channel::Success,
        second: Channel::Failure,
    };
    assert_eq!(
        err.to_string(),
        "completion already signalled on the success channel; failure channel invoked again"
    );
}
