//! The seam between the harness and an engine under test.
//!
//! An [`Engine`] creates one [`Realm`] per case variant. The harness only
//! ever compiles, evaluates and pumps jobs; everything else about the
//! engine is opaque.

use crate::error::HarnessError;
use crate::host::HostHooks;
use crate::includes::Include;
use core_types::JsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

/// Directive prologue prepended to strict-mode variants
pub const USE_STRICT: &str = "\"use strict\";\n";

/// How a variant is run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Script goal, non-strict
    Sloppy,
    /// Script goal with a `"use strict"` prologue
    Strict,
    /// Module goal
    Module,
}

impl Mode {
    /// Whether the code runs as strict mode code
    pub fn is_strict(self) -> bool {
        matches!(self, Mode::Strict | Mode::Module)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Sloppy => write!(f, "default"),
            Mode::Strict => write!(f, "strict mode"),
            Mode::Module => write!(f, "module"),
        }
    }
}

/// Everything a realm needs to run one variant
#[derive(Debug, Clone)]
pub struct Source {
    /// Case id
    pub case_id: String,
    /// File the case came from
    pub path: PathBuf,
    /// Variant
    pub mode: Mode,
    /// Helpers to load first, in order
    pub includes: Vec<Include>,
    /// Case source
    pub body: String,
    /// Completes through `$DONE`
    pub is_async: bool,
}

impl Source {
    /// Concatenates prologue, helpers and body into one script
    pub fn compose(&self) -> String {
        self.compose_with_prelude("")
    }

    /// Like [`Source::compose`], with host code placed after the directive
    /// prologue and before the helpers
    pub fn compose_with_prelude(&self, prelude: &str) -> String {
        let mut text = String::new();
        if self.mode == Mode::Strict {
            text.push_str(USE_STRICT);
        }
        text.push_str(prelude);
        for include in &self.includes {
            text.push_str(&include.text);
            if !include.text.ends_with('\n') && !include.text.is_empty() {
                text.push('\n');
            }
        }
        text.push_str(&self.body);
        text
    }
}

/// Why compiling or evaluating did not complete normally
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalFailure {
    /// The engine rejected the source before running it
    #[error("parse error: {0}")]
    Parse(JsError),
    /// Module linking failed
    #[error("resolution error: {0}")]
    Resolution(JsError),
    /// Evaluation threw and nothing caught it
    #[error("uncaught {0}")]
    Thrown(JsError),
    /// The deadline passed first
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The adapter itself failed
    #[error("host failure: {0}")]
    Host(String),
}

/// Result of pumping a realm's job queues once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// No jobs queued and none can arrive without outside help
    Idle,
    /// Jobs ran or timers are still pending
    Pending,
    /// The realm is finished; nothing else will ever run
    Exhausted,
}

/// One isolated global environment.
pub trait Realm {
    /// Parse (and for modules, link) without evaluating
    fn compile(&mut self, source: &Source, deadline: Instant) -> Result<(), EvalFailure>;

    /// Parse and run the source
    fn evaluate(&mut self, source: &Source, deadline: Instant) -> Result<(), EvalFailure>;

    /// Run whatever jobs are ready
    fn run_jobs(&mut self, deadline: Instant) -> Result<JobStatus, EvalFailure>;
}

/// An engine under test.
pub trait Engine: Send + Sync {
    /// Realm type this engine produces
    type Realm: Realm;

    /// Short name for logs
    fn name(&self) -> &str;

    /// Create a fresh realm wired to `hooks`
    fn create_realm(&self, hooks: HostHooks) -> Result<Self::Realm, HarnessError>;
}
