//! Two-channel completion cell for asynchronous test cases.
//!
//! An async case ends by calling `$DONE()` (success channel) or
//! `$DONE(error)` (failure channel). The cell records the first signal and
//! refuses every later one: a second signal is a protocol violation the
//! driver must see, and a signal arriving after the driver gave up (cell
//! closed at timeout) must not change what was already recorded.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// One of the two completion channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// `$DONE()` with no argument
    Success,
    /// `$DONE(error)`
    Failure,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Success => write!(f, "success"),
            Channel::Failure => write!(f, "failure"),
        }
    }
}

/// Terminal signal recorded by the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The success channel fired
    Resolved,
    /// The failure channel fired with this message
    Rejected(String),
}

impl Completion {
    /// The channel this completion arrived on.
    pub fn channel(&self) -> Channel {
        match self {
            Completion::Resolved => Channel::Success,
            Completion::Rejected(_) => Channel::Failure,
        }
    }
}

/// State of a [`CompletionCell`].
///
/// Transitions: `Empty → Settled` on the first signal, `Empty → Closed` when
/// the driver stops waiting. Both targets are final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    /// No signal yet
    Empty,
    /// First signal recorded
    Settled(Completion),
    /// Closed without a signal; later signals are ignored
    Closed,
}

/// Rejected write to a [`CompletionCell`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// A channel fired after the cell already settled
    #[error("completion already signalled on the {first} channel; {second} channel invoked again")]
    AlreadyCompleted {
        /// Channel of the recorded completion
        first: Channel,
        /// Channel of the rejected invocation
        second: Channel,
    },
    /// A channel fired after the cell was closed
    #[error("{0} channel invoked after the case was closed")]
    Closed(Channel),
}

#[derive(Debug)]
struct Inner {
    state: CellState,
    repeated: Vec<Channel>,
    late: Vec<Channel>,
}

/// Shared, thread-safe once-only completion slot.
///
/// Clones share the same slot, so the engine side can hold one handle while
/// the driver waits on another.
///
/// # Examples
///
/// ```
/// use async_runtime::{CellState, Completion, CompletionCell};
///
/// let cell = CompletionCell::new();
/// let engine_side = cell.clone();
///
/// engine_side.resolve().unwrap();
/// assert!(engine_side.reject("late").is_err());
///
/// assert_eq!(cell.state(), CellState::Settled(Completion::Resolved));
/// assert_eq!(cell.repeated_signals().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CompletionCell {
    shared: Arc<(Mutex<Inner>, Condvar)>,
}

impl CompletionCell {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self {
            shared: Arc::new((
                Mutex::new(Inner {
                    state: CellState::Empty,
                    repeated: Vec::new(),
                    late: Vec::new(),
                }),
                Condvar::new(),
            )),
        }
    }

    /// Signals the success channel.
    pub fn resolve(&self) -> Result<(), CompletionError> {
        self.signal(Completion::Resolved)
    }

    /// Signals the failure channel.
    pub fn reject(&self, message: impl Into<String>) -> Result<(), CompletionError> {
        self.signal(Completion::Rejected(message.into()))
    }

    fn signal(&self, completion: Completion) -> Result<(), CompletionError> {
        let (lock, cvar) = &*self.shared;
        let mut inner = lock.lock();
        let channel = completion.channel();
        match &inner.state {
            CellState::Empty => {
                inner.state = CellState::Settled(completion);
                cvar.notify_all();
                Ok(())
            }
            CellState::Settled(first) => {
                let first = first.channel();
                inner.repeated.push(channel);
                Err(CompletionError::AlreadyCompleted {
                    first,
                    second: channel,
                })
            }
            CellState::Closed => {
                inner.late.push(channel);
                Err(CompletionError::Closed(channel))
            }
        }
    }

    /// Closes an empty cell so no later signal is recorded.
    ///
    /// Returns `true` if the cell was empty. A settled cell is left as is.
    pub fn close(&self) -> bool {
        let (lock, cvar) = &*self.shared;
        let mut inner = lock.lock();
        if inner.state == CellState::Empty {
            inner.state = CellState::Closed;
            cvar.notify_all();
            true
        } else {
            false
        }
    }

    /// Current state.
    pub fn state(&self) -> CellState {
        self.shared.0.lock().state.clone()
    }

    /// The recorded completion, if the cell settled.
    pub fn completion(&self) -> Option<Completion> {
        match &self.shared.0.lock().state {
            CellState::Settled(completion) => Some(completion.clone()),
            _ => None,
        }
    }

    /// True once a signal has been recorded.
    pub fn is_settled(&self) -> bool {
        matches!(self.shared.0.lock().state, CellState::Settled(_))
    }

    /// Signals rejected because the cell had already settled.
    pub fn repeated_signals(&self) -> Vec<Channel> {
        self.shared.0.lock().repeated.clone()
    }

    /// Signals rejected because the cell had been closed.
    pub fn late_signals(&self) -> Vec<Channel> {
        self.shared.0.lock().late.clone()
    }

    /// Blocks until the cell leaves `Empty` or `deadline` passes.
    ///
    /// Returns the state observed on wake-up.
    pub fn wait_until(&self, deadline: Instant) -> CellState {
        let (lock, cvar) = &*self.shared;
        let mut inner = lock.lock();
        while inner.state == CellState::Empty {
            if cvar.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }
        inner.state.clone()
    }
}

impl Default for CompletionCell {
    fn default() -> Self {
        Self::new()
    }
}
