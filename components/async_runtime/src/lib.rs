//! Async plumbing for conformance cases.
//!
//! This crate provides the pieces an asynchronous test case needs:
//! - [`CompletionCell`] - once-only success/failure slot behind `$DONE`
//! - [`EventLoop`] - task and microtask queues for in-process realms
//!
//! # Examples
//!
//! ```
//! use async_runtime::{Completion, CompletionCell};
//!
//! let cell = CompletionCell::new();
//! cell.reject("Test262Error: expected true").unwrap();
//! assert_eq!(
//!     cell.completion(),
//!     Some(Completion::Rejected("Test262Error: expected true".to_string()))
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod completion;
pub mod event_loop;
pub mod task_queue;

pub use completion::{CellState, Channel, Completion, CompletionCell, CompletionError};
pub use event_loop::{EventLoop, LoopContext, LoopStatus};
pub use task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
