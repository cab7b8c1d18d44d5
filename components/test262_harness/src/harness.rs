use crate::config::HarnessConfig;
use crate::driver::ExecutionDriver;
use crate::engine::{Engine, Mode, Source};
use crate::error::HarnessError;
use crate::includes::IncludeRegistry;
use crate::outcome::{Expectation, Failure, FailureKind, Verdict};
use crate::report::{ReportBuilder, TestReport};
use crate::test_file::{case_id, Flag, MetadataError, TestFile, TestMetadata};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Result of one variant of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Case id
    pub id: String,
    /// Variant; `None` when the case never reached a realm
    pub mode: Option<Mode>,
    /// Verdict
    pub verdict: Verdict,
    /// Wall time
    pub duration: Duration,
    /// Non-fatal observations
    pub warnings: Vec<String>,
}

impl CaseResult {
    fn unrun(id: &str, verdict: Verdict) -> Self {
        Self {
            id: id.to_string(),
            mode: None,
            verdict,
            duration: Duration::ZERO,
            warnings: Vec::new(),
        }
    }

    /// Whether the reporter counts this result as errored
    pub fn is_errored(&self) -> bool {
        self.verdict
            .failure()
            .map(|f| f.kind.is_harness_error())
            .unwrap_or(false)
    }
}

/// Map a loader error onto the failure taxonomy
pub fn loader_failure(error: &HarnessError) -> Failure {
    let kind = match error {
        HarnessError::Metadata {
            source: MetadataError::Missing,
            ..
        } => FailureKind::MissingMetadata,
        HarnessError::Metadata { .. } => FailureKind::MalformedMetadata,
        HarnessError::UnknownInclude { .. } => FailureKind::UnknownInclude,
        HarnessError::Io { .. } | HarnessError::Engine(_) | HarnessError::Config(_) => {
            FailureKind::Host
        }
    };
    Failure::new(kind, error.to_string())
}

/// Test262 conformance test harness
pub struct Test262Harness<E: Engine> {
    engine: E,
    config: HarnessConfig,
    includes: IncludeRegistry,
}

impl<E: Engine> Test262Harness<E> {
    /// Create a harness over `engine`
    pub fn new(engine: E, config: HarnessConfig, includes: IncludeRegistry) -> Self {
        Self {
            engine,
            config,
            includes,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Get the engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Get the include registry
    pub fn includes(&self) -> &IncludeRegistry {
        &self.includes
    }

    /// Variants a case runs in
    pub fn variants(&self, metadata: &TestMetadata) -> Vec<Mode> {
        if metadata.is_module() {
            vec![Mode::Module]
        } else if metadata.is_strict_only() {
            vec![Mode::Strict]
        } else if metadata.is_no_strict() || metadata.is_raw() || !self.config.strict_variants {
            vec![Mode::Sloppy]
        } else {
            vec![Mode::Sloppy, Mode::Strict]
        }
    }

    fn skip_reason(&self, test: &TestFile) -> Option<String> {
        if test.reftest.as_ref().map_or(false, |r| r.skip) {
            return Some("reftest skip".to_string());
        }
        let missing = self.config.unsupported_features(&test.metadata.features);
        if !missing.is_empty() {
            return Some(format!("unsupported features: {}", missing.join(", ")));
        }
        if test.metadata.has_flag(Flag::CanBlockIsTrue) && !self.config.can_block {
            return Some("requires an agent that can block".to_string());
        }
        if test.metadata.has_flag(Flag::CanBlockIsFalse) && self.config.can_block {
            return Some("requires an agent that cannot block".to_string());
        }
        None
    }

    /// Run every variant of one case
    pub fn run_test(&self, test: &TestFile) -> Vec<CaseResult> {
        if let Some(reason) = self.skip_reason(test) {
            tracing::debug!(id = %test.id, %reason, "skipping");
            return vec![CaseResult::unrun(&test.id, Verdict::Skipped(reason))];
        }

        let includes = match self.includes.resolve(&test.metadata) {
            Ok(includes) => includes,
            Err(e) => {
                return vec![CaseResult::unrun(&test.id, Verdict::Failed(loader_failure(&e)))];
            }
        };

        let expectation = Expectation::from_metadata(&test.metadata);
        let mut header_warnings: Vec<String> = test
            .reftest
            .as_ref()
            .map(|r| r.conflicts_with(&test.metadata))
            .unwrap_or_default();

        self.variants(&test.metadata)
            .into_iter()
            .map(|mode| {
                let source = Source {
                    case_id: test.id.clone(),
                    path: test.path.clone(),
                    mode,
                    includes: includes.clone(),
                    body: test.code(),
                    is_async: test.metadata.is_async(),
                };
                let run = ExecutionDriver::new(&self.engine, self.config.timeout())
                    .execute(&source, &expectation);

                let mut warnings = std::mem::take(&mut header_warnings);
                let wants_marker = self.config.expect_report_compare
                    && !source.is_async
                    && expectation == Expectation::Complete;
                if wants_marker && !run.report_compare_seen {
                    warnings.push("reportCompare was never called".to_string());
                }
                for warning in &warnings {
                    tracing::warn!(id = %test.id, %mode, "{}", warning);
                }

                CaseResult {
                    id: test.id.clone(),
                    mode: Some(mode),
                    verdict: run.verdict,
                    duration: run.duration,
                    warnings,
                }
            })
            .collect()
    }

    /// Load and run one file; loader errors become errored results
    pub fn run_file(&self, path: &Path, root: Option<&Path>) -> Vec<CaseResult> {
        match TestFile::load_under(path, root, self.config.require_metadata) {
            Ok(test) => self.run_test(&test),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load test");
                let id = case_id(path, root);
                vec![CaseResult::unrun(&id, Verdict::Failed(loader_failure(&e)))]
            }
        }
    }

    /// Expand paths into sorted test files (fixtures excluded), applying the
    /// configured id filter and limit
    pub fn collect(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Option<PathBuf>)> {
        let mut files = Vec::new();
        for path in paths {
            let root = self.config.test_root.clone().or_else(|| {
                if path.is_dir() {
                    Some(path.clone())
                } else {
                    path.parent().map(Path::to_path_buf)
                }
            });
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().map(|ext| ext == "js").unwrap_or(false))
                .filter(|p| !TestFile::is_fixture(p))
                .collect();
            found.sort();
            files.extend(found.into_iter().map(|p| (p, root.clone())));
        }

        if let Some(filter) = &self.config.filter {
            files.retain(|(p, root)| case_id(p, root.as_deref()).contains(filter.as_str()));
        }
        if let Some(limit) = self.config.limit {
            files.truncate(limit);
        }
        files
    }

    /// Run every test under `paths`, calling `on_result` as results arrive
    pub fn run_paths_with<F>(&self, paths: &[PathBuf], mut on_result: F) -> TestReport
    where
        F: FnMut(&CaseResult),
    {
        let files = self.collect(paths);
        tracing::info!(
            files = files.len(),
            jobs = self.config.jobs,
            engine = self.engine.name(),
            "starting run"
        );
        if self.config.jobs <= 1 {
            let mut report = TestReport::new();
            for (path, root) in &files {
                for result in self.run_file(path, root.as_deref()) {
                    on_result(&result);
                    report.add_result(&result);
                }
            }
            return report;
        }

        let (work_tx, work_rx) = crossbeam::channel::unbounded::<(PathBuf, Option<PathBuf>)>();
        let (result_tx, result_rx) = crossbeam::channel::unbounded::<Vec<CaseResult>>();
        for item in files {
            let _ = work_tx.send(item);
        }
        drop(work_tx);

        // Each worker keeps its own report; the builder merges them at the end.
        let scoped = crossbeam::thread::scope(|scope| {
            let workers: Vec<_> = (0..self.config.jobs)
                .map(|_| {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move |_| {
                        let mut report = TestReport::new();
                        for (path, root) in work_rx.iter() {
                            let results = self.run_file(&path, root.as_deref());
                            for result in &results {
                                report.add_result(result);
                            }
                            if result_tx.send(results).is_err() {
                                break;
                            }
                        }
                        report
                    })
                })
                .collect();
            drop(result_tx);

            for results in result_rx.iter() {
                for result in &results {
                    on_result(result);
                }
            }

            let mut builder = ReportBuilder::new();
            for worker in workers {
                match worker.join() {
                    Ok(report) => {
                        builder.add_report(report);
                    }
                    Err(_) => tracing::error!("a worker thread panicked; results are incomplete"),
                }
            }
            tracing::debug!(workers = builder.count(), "merged worker reports");
            builder.build()
        });
        match scoped {
            Ok(report) => report,
            Err(_) => {
                tracing::error!("a worker thread panicked; results are incomplete");
                TestReport::new()
            }
        }
    }

    /// Run all tests in a directory
    pub fn run_directory<P: AsRef<Path>>(&self, dir: P) -> TestReport {
        self.run_paths_with(&[dir.as_ref().to_path_buf()], |_| {})
    }
}
