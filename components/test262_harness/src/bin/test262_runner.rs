//! Test262 Runner
//!
//! Runs Test262 conformance tests against an external engine shell.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use test262_harness::report::ci_line;
use test262_harness::{
    Cli, IncludeRegistry, OutputFormat, ProcessEngine, Test262Harness,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = cli.load_config().context("failed to load configuration")?;
    let Some(engine_config) = config.engine.clone() else {
        bail!("no engine configured; pass --engine or set `engine.command` in the config");
    };

    let mut paths: Vec<PathBuf> = cli.paths.clone();
    if paths.is_empty() {
        match &config.test_root {
            Some(root) => paths.push(root.clone()),
            None => bail!("no test paths given and no `test_root` configured"),
        }
    }
    for path in &paths {
        if !path.exists() {
            bail!("test path not found: {}", path.display());
        }
    }

    let include_dir = config
        .include_dir
        .clone()
        .or_else(|| IncludeRegistry::discover(&paths[0]));
    let includes = match &include_dir {
        Some(dir) => IncludeRegistry::from_dir(dir)
            .with_context(|| format!("failed to load helpers from {}", dir.display()))?,
        None => {
            tracing::warn!("no harness directory found; cases that need helpers will error");
            IncludeRegistry::empty()
        }
    };

    let output = config.output;
    let harness = Test262Harness::new(ProcessEngine::new(engine_config), config, includes);

    let start = Instant::now();
    let report = harness.run_paths_with(&paths, |result| match output {
        OutputFormat::Verbose => println!("{}", ci_line(result)),
        OutputFormat::Summary if result.verdict.is_fail() => println!("{}", ci_line(result)),
        _ => {}
    });
    let duration = start.elapsed();

    match output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Verbose => {
            println!();
            println!("{}", report.detailed_summary());
            println!("Time: {:.2}s", duration.as_secs_f64());
        }
        OutputFormat::Summary => {
            println!();
            println!("{}", report.summary());
            println!("Time: {:.2}s", duration.as_secs_f64());
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
