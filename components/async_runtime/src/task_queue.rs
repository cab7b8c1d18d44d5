//! Task and microtask queue management.
//!
//! Jobs are closures over a context type `C` (an in-process realm), so a job
//! can reach the realm's heap and host hooks and schedule further jobs.
//! Tasks may carry a ready time to model timers.

use core_types::JsError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

type Callback<C> = Box<dyn FnOnce(&mut C) -> Result<(), JsError> + Send>;

/// A macrotask (timer callback, host event).
pub struct Task<C> {
    callback: Callback<C>,
}

impl<C> Task<C> {
    /// Creates a new Task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut C) -> Result<(), JsError> + Send + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    pub fn run(self, ctx: &mut C) -> Result<(), JsError> {
        (self.callback)(ctx)
    }
}

impl<C> std::fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A microtask (promise reaction). Microtasks drain before the next task.
pub struct MicroTask<C> {
    callback: Callback<C>,
}

impl<C> MicroTask<C> {
    /// Creates a new MicroTask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut C) -> Result<(), JsError> + Send + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the microtask.
    pub fn run(self, ctx: &mut C) -> Result<(), JsError> {
        (self.callback)(ctx)
    }
}

impl<C> std::fmt::Debug for MicroTask<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MicroTask {{ ... }}")
    }
}

#[derive(Debug)]
struct Scheduled<C> {
    ready_at: Instant,
    seq: u64,
    task: Task<C>,
}

/// Queue of tasks ordered by ready time, FIFO among equal times.
#[derive(Debug)]
pub struct TaskQueue<C> {
    queue: Vec<Scheduled<C>>,
    next_seq: u64,
}

impl<C> TaskQueue<C> {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            next_seq: 0,
        }
    }

    /// Adds a task that is ready immediately.
    pub fn enqueue(&mut self, task: Task<C>) {
        self.enqueue_at(task, Instant::now());
    }

    /// Adds a task that becomes ready after `delay`.
    pub fn enqueue_after(&mut self, task: Task<C>, delay: Duration) {
        self.enqueue_at(task, Instant::now() + delay);
    }

    fn enqueue_at(&mut self, task: Task<C>, ready_at: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { ready_at, seq, task });
    }

    /// Removes the earliest task that is ready at `now`.
    pub fn dequeue_ready(&mut self, now: Instant) -> Option<Task<C>> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.ready_at <= now)
            .min_by_key(|(_, s)| (s.ready_at, s.seq))
            .map(|(i, _)| i)?;
        Some(self.queue.swap_remove(index).task)
    }

    /// Ready time of the earliest queued task.
    pub fn next_ready_at(&self) -> Option<Instant> {
        self.queue.iter().map(|s| s.ready_at).min()
    }

    /// Returns true if no task is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// FIFO queue of microtasks.
#[derive(Debug)]
pub struct MicrotaskQueue<C> {
    queue: VecDeque<MicroTask<C>>,
}

impl<C> MicrotaskQueue<C> {
    /// Creates a new empty MicrotaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a microtask to the end of the queue.
    pub fn enqueue(&mut self, microtask: MicroTask<C>) {
        self.queue.push_back(microtask);
    }

    /// Removes the oldest microtask.
    pub fn dequeue(&mut self) -> Option<MicroTask<C>> {
        self.queue.pop_front()
    }

    /// Returns true if no microtask is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued microtasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<C> Default for MicrotaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}
