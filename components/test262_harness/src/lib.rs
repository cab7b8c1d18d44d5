//! Test262 Conformance Test Harness
//!
//! Runs Test262-style conformance cases against an ECMAScript engine that
//! the harness treats as a black box. The pieces:
//!
//! - [`test_file`] and [`includes`] load cases and their helper files
//! - [`driver`] runs one variant in a fresh realm and judges the outcome
//! - [`assert`] and [`sandbox`] provide the assertion library and an
//!   object heap for in-process engines
//! - [`scripted`] and [`process`] are the two engine adapters
//! - [`harness`] and [`report`] run whole suites and summarize them

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assert;
pub mod cli;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod harness;
pub mod host;
pub mod includes;
pub mod outcome;
pub mod process;
pub mod report;
pub mod sandbox;
pub mod scripted;
pub mod test_file;

pub use assert::{AssertionFailure, ObjectAccess, VerifyOptions};
pub use cli::Cli;
pub use config::{ConfigError, EngineConfig, FeatureConfig, HarnessConfig, OutputFormat};
pub use driver::{CaseRun, DriverState, ExecutionDriver};
pub use engine::{Engine, EvalFailure, JobStatus, Mode, Realm, Source};
pub use error::{HarnessError, HarnessResult};
pub use harness::{CaseResult, Test262Harness};
pub use host::HostHooks;
pub use includes::{Include, IncludeRegistry};
pub use outcome::{ExecutionOutcome, Expectation, Failure, FailureKind, Verdict};
pub use process::ProcessEngine;
pub use report::{FailureRecord, ReportBuilder, TestReport};
pub use sandbox::Heap;
pub use scripted::{ScriptContext, ScriptedEngine};
pub use test_file::{Flag, MetadataError, NegativeExpectation, Phase, TestFile, TestMetadata};
