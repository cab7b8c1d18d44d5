//! In-process engine driven by Rust closures.
//!
//! Each case id maps to a parse behaviour and a body closure that acts on a
//! [`ScriptContext`]: a fresh sandbox heap, the host hooks and an event
//! loop. The harness uses it to exercise its own lifecycle logic without an
//! external engine.

use crate::engine::{Engine, EvalFailure, JobStatus, Mode, Realm, Source};
use crate::error::HarnessError;
use crate::host::HostHooks;
use crate::sandbox::Heap;
use async_runtime::{EventLoop, LoopContext, LoopStatus, MicroTask, Task};
use core_types::{JsError, ObjectId, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

type Body = Arc<dyn Fn(&mut ScriptContext) -> Result<(), JsError> + Send + Sync>;

#[derive(Clone)]
enum ParseBehavior {
    Accept,
    Reject(JsError),
    RejectStrict(JsError),
    Unresolvable(JsError),
}

#[derive(Clone)]
struct Program {
    parse: ParseBehavior,
    body: Option<Body>,
}

/// The realm state a scripted body runs against
pub struct ScriptContext {
    /// This realm's objects
    pub heap: Heap,
    /// Host hooks for this realm
    pub hooks: HostHooks,
    /// Running as strict mode code
    pub strict: bool,
    /// Running with the module goal
    pub module: bool,
    /// Helpers loaded before the body
    pub includes: Vec<String>,
    jobs: EventLoop<ScriptContext>,
}

impl LoopContext for ScriptContext {
    fn event_loop(&mut self) -> &mut EventLoop<Self> {
        &mut self.jobs
    }
}

impl ScriptContext {
    fn new(hooks: HostHooks) -> Self {
        Self {
            heap: Heap::new(),
            hooks,
            strict: false,
            module: false,
            includes: Vec::new(),
            jobs: EventLoop::new(),
        }
    }

    /// The global object
    pub fn global(&self) -> ObjectId {
        self.heap.global()
    }

    /// Whether a helper was loaded
    pub fn has_include(&self, name: &str) -> bool {
        self.includes.iter().any(|n| n == name)
    }

    /// `$DONE()`; a repeated call is recorded by the completion cell
    pub fn done(&self) {
        let _ = self.hooks.done(None);
    }

    /// `$DONE(error)`
    pub fn done_with_error(&self, message: &str) {
        let _ = self.hooks.done(Some(message));
    }

    /// `$DONOTEVALUATE()`; returns the error the body should throw
    pub fn do_not_evaluate(&self) -> JsError {
        self.hooks.do_not_evaluate()
    }

    /// `reportCompare(expected, actual)`
    pub fn report_compare(&self, expected: &Value, actual: &Value) -> Result<(), JsError> {
        self.hooks.report_compare(expected, actual, None)
    }

    /// `print(line)`
    pub fn print(&self, line: impl Into<String>) {
        self.hooks.print(line);
    }

    /// `setTimeout(callback, delay)`
    pub fn set_timeout<F>(&mut self, delay: Duration, callback: F)
    where
        F: FnOnce(&mut ScriptContext) -> Result<(), JsError> + Send + 'static,
    {
        self.jobs.enqueue_delayed(Task::new(callback), delay);
    }

    /// `queueMicrotask(callback)`
    pub fn queue_microtask<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut ScriptContext) -> Result<(), JsError> + Send + 'static,
    {
        self.jobs.enqueue_microtask(MicroTask::new(callback));
    }
}

/// Engine whose programs are Rust closures keyed by case id
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    programs: Arc<HashMap<String, Program>>,
}

impl ScriptedEngine {
    /// Engine with no programs
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(mut self, id: impl Into<String>, program: Program) -> Self {
        Arc::make_mut(&mut self.programs).insert(id.into(), program);
        self
    }

    /// A case that parses and runs `body`
    pub fn script<F>(self, id: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut ScriptContext) -> Result<(), JsError> + Send + Sync + 'static,
    {
        self.insert(
            id,
            Program {
                parse: ParseBehavior::Accept,
                body: Some(Arc::new(body)),
            },
        )
    }

    /// A case the engine refuses to parse
    pub fn parse_error(self, id: impl Into<String>, error: JsError) -> Self {
        self.insert(
            id,
            Program {
                parse: ParseBehavior::Reject(error),
                body: None,
            },
        )
    }

    /// A case that parses as sloppy code but is an early error in strict code
    pub fn strict_parse_error<F>(self, id: impl Into<String>, error: JsError, body: F) -> Self
    where
        F: Fn(&mut ScriptContext) -> Result<(), JsError> + Send + Sync + 'static,
    {
        self.insert(
            id,
            Program {
                parse: ParseBehavior::RejectStrict(error),
                body: Some(Arc::new(body)),
            },
        )
    }

    /// A module whose imports fail to link
    pub fn resolution_error(self, id: impl Into<String>, error: JsError) -> Self {
        self.insert(
            id,
            Program {
                parse: ParseBehavior::Unresolvable(error),
                body: None,
            },
        )
    }
}

impl Engine for ScriptedEngine {
    type Realm = ScriptedRealm;

    fn name(&self) -> &str {
        "scripted"
    }

    fn create_realm(&self, hooks: HostHooks) -> Result<Self::Realm, HarnessError> {
        Ok(ScriptedRealm {
            programs: Arc::clone(&self.programs),
            ctx: ScriptContext::new(hooks),
        })
    }
}

/// A realm of the [`ScriptedEngine`]
pub struct ScriptedRealm {
    programs: Arc<HashMap<String, Program>>,
    ctx: ScriptContext,
}

impl ScriptedRealm {
    /// The realm's context, for inspection after a run
    pub fn context(&self) -> &ScriptContext {
        &self.ctx
    }

    fn program(&self, id: &str) -> Result<Program, EvalFailure> {
        self.programs
            .get(id)
            .cloned()
            .ok_or_else(|| EvalFailure::Host(format!("no scripted program for {}", id)))
    }
}

impl Realm for ScriptedRealm {
    fn compile(&mut self, source: &Source, _deadline: Instant) -> Result<(), EvalFailure> {
        match self.program(&source.case_id)?.parse {
            ParseBehavior::Accept => Ok(()),
            ParseBehavior::Reject(e) => Err(EvalFailure::Parse(e)),
            ParseBehavior::RejectStrict(e) if source.mode.is_strict() => Err(EvalFailure::Parse(e)),
            ParseBehavior::RejectStrict(_) => Ok(()),
            ParseBehavior::Unresolvable(e) if source.mode == Mode::Module => {
                Err(EvalFailure::Resolution(e))
            }
            ParseBehavior::Unresolvable(_) => Ok(()),
        }
    }

    fn evaluate(&mut self, source: &Source, deadline: Instant) -> Result<(), EvalFailure> {
        self.compile(source, deadline)?;
        if Instant::now() >= deadline {
            return Err(EvalFailure::DeadlineExceeded);
        }
        self.ctx.strict = source.mode.is_strict();
        self.ctx.module = source.mode == Mode::Module;
        self.ctx.includes = source.includes.iter().map(|i| i.name.clone()).collect();

        match self.program(&source.case_id)?.body {
            Some(body) => body(&mut self.ctx).map_err(EvalFailure::Thrown),
            None => Ok(()),
        }
    }

    fn run_jobs(&mut self, deadline: Instant) -> Result<JobStatus, EvalFailure> {
        EventLoop::run_ready_until(&mut self.ctx, deadline).map_err(EvalFailure::Thrown)?;
        Ok(match self.ctx.jobs.status() {
            LoopStatus::Idle => JobStatus::Idle,
            LoopStatus::Waiting(_) => JobStatus::Pending,
        })
    }
}
