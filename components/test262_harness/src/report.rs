use crate::engine::Mode;
use crate::harness::CaseResult;
use crate::outcome::{FailureKind, Verdict};
use serde::{Deserialize, Serialize};

/// One failed or errored variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Case id
    pub id: String,
    /// Variant, when the case reached a realm
    pub mode: Option<Mode>,
    /// Failure category
    pub kind: FailureKind,
    /// First failure message
    pub message: String,
}

/// Test run report with statistics and failure details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    /// Total number of variants run
    pub total: usize,
    /// Number that passed
    pub passed: usize,
    /// Number that failed a conformance check
    pub failed: usize,
    /// Number that hit a harness or protocol error
    pub errored: usize,
    /// Number skipped
    pub skipped: usize,
    /// Number that timed out (also counted in `errored`)
    pub timeout: usize,
    /// Failed and errored variants
    pub failures: Vec<FailureRecord>,
    /// Skipped cases with (id, reason)
    pub skips: Vec<(String, String)>,
    /// Warnings with (id, message)
    pub warnings: Vec<(String, String)>,
}

/// One line per result, for CI logs:
/// `PASS|FAIL|ERROR|SKIP <id> (<mode>)[: reason]`
pub fn ci_line(result: &CaseResult) -> String {
    let label = match &result.verdict {
        Verdict::Passed => "PASS",
        Verdict::Skipped(_) => "SKIP",
        Verdict::Failed(_) if result.is_errored() => "ERROR",
        Verdict::Failed(_) => "FAIL",
    };
    let mut line = format!("{} {}", label, result.id);
    if let Some(mode) = result.mode {
        line.push_str(&format!(" ({})", mode));
    }
    match &result.verdict {
        Verdict::Passed => {}
        Verdict::Skipped(reason) => line.push_str(&format!(": {}", reason)),
        Verdict::Failed(failure) => line.push_str(&format!(": {}", failure)),
    }
    line
}

impl TestReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant result to the report
    pub fn add_result(&mut self, result: &CaseResult) {
        self.total += 1;
        for warning in &result.warnings {
            self.warnings.push((result.id.clone(), warning.clone()));
        }
        match &result.verdict {
            Verdict::Passed => self.passed += 1,
            Verdict::Skipped(reason) => {
                self.skipped += 1;
                self.skips.push((result.id.clone(), reason.clone()));
            }
            Verdict::Failed(failure) => {
                if failure.kind.is_harness_error() {
                    self.errored += 1;
                } else {
                    self.failed += 1;
                }
                if failure.kind == FailureKind::Timeout {
                    self.timeout += 1;
                }
                self.failures.push(FailureRecord {
                    id: result.id.clone(),
                    mode: result.mode,
                    kind: failure.kind,
                    message: failure.message.clone(),
                });
            }
        }
    }

    /// Calculate the pass rate as a percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// Calculate the effective pass rate (excluding skips)
    pub fn effective_pass_rate(&self) -> f64 {
        let executed = self.total - self.skipped;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }

    /// Generate a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Test262 Results:\n\
             Total: {}\n\
             Passed: {} ({:.1}%)\n\
             Failed: {}\n\
             Errored: {} ({} timeouts)\n\
             Skipped: {}\n\
             Warnings: {}\n\
             Effective Pass Rate: {:.1}%",
            self.total,
            self.passed,
            self.pass_rate(),
            self.failed,
            self.errored,
            self.timeout,
            self.skipped,
            self.warnings.len(),
            self.effective_pass_rate()
        )
    }

    /// Generate a detailed report including failures
    pub fn detailed_summary(&self) -> String {
        let mut output = self.summary();

        if !self.failures.is_empty() {
            output.push_str("\n\nFailures:\n");
            for record in &self.failures {
                let mode = record.mode.map(|m| format!(" ({})", m)).unwrap_or_default();
                output.push_str(&format!(
                    "  - {}{}\n    {}: {}\n",
                    record.id, mode, record.kind, record.message
                ));
            }
        }

        output
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: &TestReport) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.errored += other.errored;
        self.skipped += other.skipped;
        self.timeout += other.timeout;
        self.failures.extend(other.failures.iter().cloned());
        self.skips.extend(other.skips.iter().cloned());
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Check if no variant failed or errored
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Export report as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Aggregates the reports built by parallel workers
#[derive(Debug, Default)]
pub struct ReportBuilder {
    reports: Vec<TestReport>,
}

impl ReportBuilder {
    /// Create a new report builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report to be aggregated
    pub fn add_report(&mut self, report: TestReport) -> &mut Self {
        self.reports.push(report);
        self
    }

    /// Build an aggregated report from all added reports
    pub fn build(&self) -> TestReport {
        let mut combined = TestReport::new();
        for report in &self.reports {
            combined.merge(report);
        }
        combined
    }

    /// Get number of reports added
    pub fn count(&self) -> usize {
        self.reports.len()
    }
}
