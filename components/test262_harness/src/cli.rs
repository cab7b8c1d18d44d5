//! Command-line interface for the runner binary.

use crate::config::{ConfigError, EngineConfig, HarnessConfig, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "test262_runner")]
#[command(about = "Run Test262 conformance tests against an ECMAScript engine", long_about = None)]
pub struct Cli {
    /// Test files or directories
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// YAML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Engine executable (overrides the config)
    #[arg(short, long, value_name = "COMMAND")]
    pub engine: Option<String>,

    /// Extra argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Directory holding the harness helper files
    #[arg(long, value_name = "DIR")]
    pub include_dir: Option<PathBuf>,

    /// Per-case timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Worker threads
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Only run tests whose id contains this string
    #[arg(long)]
    pub filter: Option<String>,

    /// Stop after this many files
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Run unflagged scripts in sloppy mode only
    #[arg(long)]
    pub no_strict_variants: bool,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Load the config file (or defaults) and apply command-line overrides
    pub fn load_config(&self) -> Result<HarnessConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides to `config`
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(command) = &self.engine {
            let engine = config.engine.get_or_insert_with(EngineConfig::default);
            engine.command = command.clone();
        }
        if !self.engine_args.is_empty() {
            let engine = config.engine.get_or_insert_with(EngineConfig::default);
            engine.args.extend(self.engine_args.iter().cloned());
        }
        if let Some(dir) = &self.include_dir {
            config.include_dir = Some(dir.clone());
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(filter) = &self.filter {
            config.filter = Some(filter.clone());
        }
        if let Some(limit) = self.limit {
            config.limit = Some(limit);
        }
        if let Some(format) = self.format {
            config.output = format;
        }
        if self.no_strict_variants {
            config.strict_variants = false;
        }
    }

    /// Default log filter for the verbosity level
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "test262_harness=debug",
            _ => "test262_harness=trace",
        }
    }
}
