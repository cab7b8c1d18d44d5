//! Event loop implementation.
//!
//! The loop lives inside the context it runs jobs against, so it cannot own
//! the run loop itself: [`EventLoop::run_ready`] takes the context, pops one
//! job at a time and releases the borrow before running it.

use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
use core_types::JsError;
use std::time::{Duration, Instant};

/// A context that owns an event loop of its own type.
pub trait LoopContext: Sized {
    /// The loop scheduling jobs for this context.
    fn event_loop(&mut self) -> &mut EventLoop<Self>;
}

enum Job<C> {
    Task(Task<C>),
    Micro(MicroTask<C>),
}

/// Whether more work may arrive without outside help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// Nothing queued
    Idle,
    /// Only timers that are not yet ready; the earliest fires at this instant
    Waiting(Instant),
}

/// Task and microtask scheduling for one realm.
///
/// Each turn runs one ready task, then drains all microtasks.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, LoopContext, MicroTask, Task};
///
/// struct Ctx {
///     log: Vec<&'static str>,
///     jobs: EventLoop<Ctx>,
/// }
///
/// impl LoopContext for Ctx {
///     fn event_loop(&mut self) -> &mut EventLoop<Self> {
///         &mut self.jobs
///     }
/// }
///
/// let mut ctx = Ctx { log: vec![], jobs: EventLoop::new() };
/// ctx.jobs.enqueue_task(Task::new(|c: &mut Ctx| {
///     c.log.push("task");
///     c.jobs.enqueue_microtask(MicroTask::new(|c: &mut Ctx| {
///         c.log.push("micro");
///         Ok(())
///     }));
///     Ok(())
/// }));
///
/// EventLoop::run_ready(&mut ctx).unwrap();
/// assert_eq!(ctx.log, vec!["task", "micro"]);
/// ```
#[derive(Debug)]
pub struct EventLoop<C> {
    task_queue: TaskQueue<C>,
    microtask_queue: MicrotaskQueue<C>,
}

impl<C> EventLoop<C> {
    /// Creates a new EventLoop with empty queues.
    pub fn new() -> Self {
        Self {
            task_queue: TaskQueue::new(),
            microtask_queue: MicrotaskQueue::new(),
        }
    }

    /// Adds a task that is ready immediately.
    pub fn enqueue_task(&mut self, task: Task<C>) {
        self.task_queue.enqueue(task);
    }

    /// Adds a task that becomes ready after `delay` (a timer).
    pub fn enqueue_delayed(&mut self, task: Task<C>, delay: Duration) {
        self.task_queue.enqueue_after(task, delay);
    }

    /// Adds a microtask.
    pub fn enqueue_microtask(&mut self, microtask: MicroTask<C>) {
        self.microtask_queue.enqueue(microtask);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.task_queue.is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.microtask_queue.is_empty()
    }

    /// Reports whether anything is left to run.
    pub fn status(&self) -> LoopStatus {
        match self.task_queue.next_ready_at() {
            Some(at) => LoopStatus::Waiting(at),
            None if self.microtask_queue.is_empty() => LoopStatus::Idle,
            None => LoopStatus::Waiting(Instant::now()),
        }
    }

    fn next_job(&mut self, now: Instant) -> Option<Job<C>> {
        if let Some(micro) = self.microtask_queue.dequeue() {
            return Some(Job::Micro(micro));
        }
        self.task_queue.dequeue_ready(now).map(Job::Task)
    }
}

impl<C: LoopContext> EventLoop<C> {
    /// Runs every job that is ready now, including jobs they schedule.
    ///
    /// Returns the number of jobs run. The first job error stops the loop
    /// and is returned; remaining jobs stay queued.
    pub fn run_ready(ctx: &mut C) -> Result<usize, JsError> {
        let mut ran = 0;
        loop {
            let job = ctx.event_loop().next_job(Instant::now());
            match job {
                Some(Job::Micro(micro)) => micro.run(ctx)?,
                Some(Job::Task(task)) => task.run(ctx)?,
                None => return Ok(ran),
            }
            ran += 1;
        }
    }

    /// Like [`EventLoop::run_ready`], but stops once `deadline` has passed.
    ///
    /// Jobs that keep rescheduling themselves cannot hold the caller past
    /// the deadline; whatever is still queued stays queued.
    pub fn run_ready_until(ctx: &mut C, deadline: Instant) -> Result<usize, JsError> {
        let mut ran = 0;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(ran);
            }
            let job = ctx.event_loop().next_job(now);
            match job {
                Some(Job::Micro(micro)) => micro.run(ctx)?,
                Some(Job::Task(task)) => task.run(ctx)?,
                None => return Ok(ran),
            }
            ran += 1;
        }
    }
}

impl<C> Default for EventLoop<C> {
    fn default() -> Self {
        Self::new()
    }
}
