//! Engine adapter that runs an external shell (`d8`, `js`, `node`, ...).
//!
//! Every variant is written to a temporary file together with a small host
//! prelude and run in its own process. The prelude prints a start marker,
//! so an uncaught error seen before the marker is a parse (or module link)
//! error and one seen after it is a runtime error. Completion, `print` and
//! `reportCompare` calls come back as marker lines on stdout.

use crate::config::EngineConfig;
use crate::engine::{Engine, EvalFailure, JobStatus, Mode, Realm, Source};
use crate::error::HarnessError;
use crate::host::HostHooks;
use core_types::{ErrorKind, JsError, SourcePosition};
use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;
use regex::{Captures, Regex};
use std::io::{self, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// Printed by the prelude once evaluation begins
pub const EVALUATING_MARKER: &str = "Test262:Evaluating";
/// Printed by `reportCompare`
pub const REPORT_COMPARE_MARKER: &str = "Test262:ReportCompare";
/// Printed by `$DONE()`
pub const ASYNC_COMPLETE_MARKER: &str = "Test262:AsyncTestComplete";
/// Prefix printed by `$DONE(error)`
pub const ASYNC_FAILURE_PREFIX: &str = "Test262:AsyncTestFailure:";

/// Host code placed ahead of the helpers
pub const PRELUDE: &str = r#"if (typeof print !== 'function') { var print = console.log.bind(console); }
function reportCompare(expected, actual, message) {
  print('Test262:ReportCompare');
  var same = expected === actual
    ? expected !== 0 || 1 / expected === 1 / actual
    : expected !== expected && actual !== actual;
  if (!same) {
    throw new Test262Error((message ? message + ' ' : '') +
      'Expected SameValue(«' + String(actual) + '», «' + String(expected) + '») to be true');
  }
}
print('Test262:Evaluating');
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

// How long to wait for the output pipes to close once the engine is gone.
// A descendant of the engine may hold them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

fn uncaught_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z][A-Za-z0-9]*Error)\b(?::\s*(.*))?$").expect("error pattern is valid")
    })
}

// An engine's own error report: `file:line[:col]: Kind: message` (d8, js)
// or `Uncaught Kind: message` (node).
fn report_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:\S+?:(?P<line>\d+)(?::(?P<col>\d+))?:?\s+|Uncaught\s+)(?P<kind>[A-Z][A-Za-z0-9]*Error)(?::\s*(?P<msg>.*))?$",
        )
        .expect("report pattern is valid")
    })
}

fn error_from_report(caps: &Captures<'_>) -> JsError {
    let kind = ErrorKind::from_name(&caps["kind"]);
    let message = caps.name("msg").map(|m| m.as_str().trim()).unwrap_or("");
    let error = JsError::new(kind, message);
    match caps.name("line").and_then(|l| l.as_str().parse().ok()) {
        Some(line) => {
            let column = caps
                .name("col")
                .and_then(|c| c.as_str().parse().ok())
                .unwrap_or(0);
            error.at(SourcePosition { line, column })
        }
        None => error,
    }
}

fn error_from_name(caps: &Captures<'_>) -> JsError {
    let kind = ErrorKind::from_name(&caps[1]);
    let message = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    JsError::new(kind, message)
}

/// Adapter for a command-line engine
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    /// Create from the `engine` config section
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Engine for ProcessEngine {
    type Realm = ProcessRealm;

    fn name(&self) -> &str {
        &self.config.command
    }

    fn create_realm(&self, hooks: HostHooks) -> Result<Self::Realm, HarnessError> {
        if self.config.command.trim().is_empty() {
            return Err(HarnessError::Engine("no engine command configured".to_string()));
        }
        Ok(ProcessRealm {
            config: self.config.clone(),
            hooks,
        })
    }
}

/// What one engine process produced
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status, `None` when the process was killed at the deadline
    pub status: Option<ExitStatus>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the prelude's start marker was printed
    pub fn started_evaluating(&self) -> bool {
        self.stdout.lines().any(|l| l.trim() == EVALUATING_MARKER)
    }

    /// The first uncaught error reported.
    ///
    /// Any error name on stderr counts. On stdout only lines in an engine's
    /// error-report shape do, so printed text such as `TypeError expected`
    /// is not mistaken for an uncaught error.
    pub fn uncaught_error(&self) -> Option<JsError> {
        let from_stderr = self.stderr.lines().map(str::trim).find_map(|line| {
            report_re()
                .captures(line)
                .map(|caps| error_from_report(&caps))
                .or_else(|| uncaught_re().captures(line).map(|caps| error_from_name(&caps)))
        });
        from_stderr.or_else(|| {
            self.stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.starts_with("Test262:"))
                .find_map(|line| report_re().captures(line).map(|caps| error_from_report(&caps)))
        })
    }
}

/// A realm backed by one engine process per run
#[derive(Debug)]
pub struct ProcessRealm {
    config: EngineConfig,
    hooks: HostHooks,
}

impl ProcessRealm {
    fn spawn(
        &self,
        extra_args: &[String],
        source: &Source,
        deadline: Instant,
    ) -> Result<ProcessOutput, EvalFailure> {
        let suffix = if source.mode == Mode::Module { ".mjs" } else { ".js" };
        let mut file = tempfile::Builder::new()
            .prefix("test262-")
            .suffix(suffix)
            .tempfile()
            .map_err(|e| EvalFailure::Host(format!("failed to create temp file: {}", e)))?;
        file.write_all(source.compose_with_prelude(PRELUDE).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| EvalFailure::Host(format!("failed to write temp file: {}", e)))?;

        let mut command = Command::new(&self.config.command);
        command.args(&self.config.args);
        if source.mode == Mode::Module {
            command.args(&self.config.module_args);
        }
        command
            .args(extra_args)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::trace!(?command, "spawning engine");

        let mut child = command.spawn().map_err(|e| {
            EvalFailure::Host(format!("failed to run {}: {}", self.config.command, e))
        })?;

        let stdout = child.stdout.take().map(Capture::start);
        let stderr = child.stderr.take().map(Capture::start);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::debug!(id = %source.case_id, "killed engine at deadline");
                    break None;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(EvalFailure::Host(format!("failed to wait for engine: {}", e))),
            }
        };

        let until = Instant::now() + DRAIN_GRACE;
        Ok(ProcessOutput {
            status,
            stdout: stdout.map(|c| c.finish(until)).unwrap_or_default(),
            stderr: stderr.map(|c| c.finish(until)).unwrap_or_default(),
        })
    }

    fn dispatch_markers(&self, output: &ProcessOutput) {
        for line in output.stdout.lines() {
            let line = line.trim_end();
            if line == EVALUATING_MARKER {
                continue;
            } else if line == REPORT_COMPARE_MARKER {
                self.hooks.mark_report_compare();
            } else if line == ASYNC_COMPLETE_MARKER {
                let _ = self.hooks.done(None);
            } else if let Some(message) = line.strip_prefix(ASYNC_FAILURE_PREFIX) {
                let _ = self.hooks.done(Some(message.trim()));
            } else {
                self.hooks.print(line);
            }
        }
    }

    fn early_error(source: &Source, error: JsError) -> EvalFailure {
        if source.mode == Mode::Module && error.kind != ErrorKind::SyntaxError {
            EvalFailure::Resolution(error)
        } else {
            EvalFailure::Parse(error)
        }
    }

    fn classify(&self, source: &Source, output: &ProcessOutput) -> Result<(), EvalFailure> {
        let Some(status) = output.status else {
            return Err(EvalFailure::DeadlineExceeded);
        };
        let error = output.uncaught_error();
        match (output.started_evaluating(), error) {
            (false, Some(error)) => Err(Self::early_error(source, error)),
            (true, Some(error)) if !status.success() => Err(EvalFailure::Thrown(error)),
            _ if status.success() => Ok(()),
            _ => Err(EvalFailure::Host(format!(
                "engine exited with {} and no recognizable error",
                status
            ))),
        }
    }
}

/// Output read from one pipe by a detached thread
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: Receiver<()>,
}

impl Capture {
    fn start<R: Read + Send + 'static>(mut pipe: R) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (tx, closed) = channel::bounded(1);
        let sink = Arc::clone(&buffer);
        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = tx.send(());
        });
        Self { buffer, closed }
    }

    /// Wait until the pipe closes or `until` passes, then take what was read.
    fn finish(self, until: Instant) -> String {
        if self.closed.recv_deadline(until).is_err() {
            tracing::debug!("engine output pipe still open; keeping what was read");
        }
        let bytes = std::mem::take(&mut *self.buffer.lock());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Realm for ProcessRealm {
    fn compile(&mut self, source: &Source, deadline: Instant) -> Result<(), EvalFailure> {
        match self.config.parse_only_args.clone() {
            Some(args) => {
                let output = self.spawn(&args, source, deadline)?;
                self.classify(source, &output)
            }
            // Without a parse-only switch the case is run; the body's own
            // `$DONOTEVALUATE()` stops it right after the start marker.
            None => {
                let output = self.spawn(&[], source, deadline)?;
                if output.status.is_none() {
                    return Err(EvalFailure::DeadlineExceeded);
                }
                match (output.started_evaluating(), output.uncaught_error()) {
                    (false, Some(error)) => Err(Self::early_error(source, error)),
                    _ => Ok(()),
                }
            }
        }
    }

    fn evaluate(&mut self, source: &Source, deadline: Instant) -> Result<(), EvalFailure> {
        let output = self.spawn(&[], source, deadline)?;
        self.dispatch_markers(&output);
        self.classify(source, &output)
    }

    fn run_jobs(&mut self, _deadline: Instant) -> Result<JobStatus, EvalFailure> {
        Ok(JobStatus::Exhausted)
    }
}
