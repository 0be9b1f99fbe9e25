//! Canonical test result model
//!
//! Both parsers reduce their input to the same [`TestResult`] shape, so
//! downstream consumers never need to know which format a log arrived in.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Classification of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The test started but no terminal event was seen
    Running,
    /// The test passed
    Pass,
    /// The test failed
    Fail,
    /// The test was skipped
    Skip,
}

impl TestStatus {
    /// String form matching the serialized representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Running => "running",
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Skip => "skip",
        }
    }

    /// Map a terminal event action (`pass`/`fail`/`skip`) to its status
    pub(crate) fn from_terminal_action(action: &str) -> Option<Self> {
        match action {
            "pass" => Some(TestStatus::Pass),
            "fail" => Some(TestStatus::Fail),
            "skip" => Some(TestStatus::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-test record: status, captured output, extracted diagnostic, elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDetail {
    /// Final status; stays `running` if the log ended before a terminal event
    pub status: TestStatus,
    /// Full captured output, concatenated in arrival order
    #[serde(default)]
    pub output: String,
    /// Short diagnostic extracted from the output; only meaningful on `fail`
    #[serde(default)]
    pub error: String,
    /// Elapsed seconds as reported by the terminal event
    #[serde(default)]
    pub elapsed: f64,
}

impl TestDetail {
    /// Detail for a test that has started but not finished
    pub(crate) fn running() -> Self {
        Self {
            status: TestStatus::Running,
            output: String::new(),
            error: String::new(),
            elapsed: 0.0,
        }
    }
}

/// Aggregate output of a parse pass: counts, name lists, per-test details,
/// package list.
///
/// Name lists preserve the order terminal events arrived in the source
/// stream. `total_tests` is recomputed from the three terminal counters at
/// the end of every parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Total number of tests with a terminal outcome
    pub total_tests: usize,
    /// Number of passed tests
    pub passed_tests: usize,
    /// Number of failed tests
    pub failed_tests: usize,
    /// Number of skipped tests
    pub skipped_tests: usize,
    /// Failed test names, in terminal-event order
    pub failed_test_names: Vec<String>,
    /// Passed test names, in terminal-event order
    pub passed_test_names: Vec<String>,
    /// Skipped test names, in terminal-event order
    pub skipped_test_names: Vec<String>,
    /// Per-test details keyed by test name
    pub test_details: HashMap<String, TestDetail>,
    /// Distinct package names, in first-seen order
    pub packages: Vec<String>,
}

impl TestResult {
    /// Whether no test failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_tests == 0
    }

    /// Detail for a single test, if it was seen
    #[must_use]
    pub fn detail(&self, test_name: &str) -> Option<&TestDetail> {
        self.test_details.get(test_name)
    }

    /// Recompute `total_tests` from the terminal counters.
    pub(crate) fn recompute_total(&mut self) {
        self.total_tests = self.passed_tests + self.failed_tests + self.skipped_tests;
    }

    /// Record a package name the first time it is seen.
    pub(crate) fn record_package(&mut self, seen: &mut HashSet<String>, package: &str) {
        if !package.is_empty() && seen.insert(package.to_string()) {
            self.packages.push(package.to_string());
        }
    }

    /// Fold a terminal event into the counters, name lists, and details.
    ///
    /// `output` is the test's fully joined captured output; the failure
    /// diagnostic is extracted from it when the status is `fail`.
    pub(crate) fn record_terminal(
        &mut self,
        test_name: &str,
        status: TestStatus,
        elapsed: f64,
        output: String,
    ) {
        match status {
            TestStatus::Pass => {
                self.passed_tests += 1;
                self.passed_test_names.push(test_name.to_string());
            }
            TestStatus::Fail => {
                self.failed_tests += 1;
                self.failed_test_names.push(test_name.to_string());
            }
            TestStatus::Skip => {
                self.skipped_tests += 1;
                self.skipped_test_names.push(test_name.to_string());
            }
            TestStatus::Running => return,
        }

        let error = if status == TestStatus::Fail {
            crate::extract::extract_error(&output)
        } else {
            String::new()
        };

        let detail = self
            .test_details
            .entry(test_name.to_string())
            .or_insert_with(TestDetail::running);
        detail.status = status;
        detail.elapsed = elapsed;
        detail.output = output;
        detail.error = error;
    }
}
