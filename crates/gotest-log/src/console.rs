//! Console-format `go test` output parsing
//!
//! The human-readable format interleaves test markers (`=== RUN`,
//! `--- PASS:`, ...) with free-form output lines. A single cursor tracks
//! which test is currently open; unrecognized lines accumulate in that
//! test's output buffer until a terminal marker closes it.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ParseError;
use crate::result::{TestDetail, TestResult, TestStatus};

/// Lines sampled by the format validator.
const SAMPLE_LINES: usize = 100;

/// Name of the synthetic failing test holding compiler diagnostics.
const BUILD_ERROR_TEST: &str = "BuildError";

// ============================================================================
// Line patterns
// ============================================================================

static RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=== RUN\s+(.+)$").expect("run pattern"));
static PASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- PASS:\s+(.+?)\s+\(([0-9.]+)s\)$").expect("pass pattern"));
static FAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- FAIL:\s+(.+?)\s+\(([0-9.]+)s\)$").expect("fail pattern"));
static SKIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- SKIP:\s+(.+?)\s+\(([0-9.]+)s\)$").expect("skip pattern"));
static PKG_OK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ok|PASS)\s+(.+?)(?:\s+\(cached\))?(?:\s+([0-9.]+)s)?$").expect("ok pattern")
});
static PKG_FAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^FAIL\s+(.+?)(?:\s+\[build failed\])?(?:\s+([0-9.]+)s)?$").expect("fail pattern")
});
static BUILD_ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+?:\d+:\d+:\s+.+$").expect("build error pattern"));

/// Marker shapes accepted by the console validator.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:=== RUN\s+|--- (?:PASS|FAIL|SKIP):\s+|(?:ok|PASS)\s+|FAIL\s+)")
        .expect("marker pattern")
});

// ============================================================================
// Parser
// ============================================================================

/// The test whose output lines are currently being captured.
enum Cursor {
    Idle,
    Open { name: String, buffer: Vec<String> },
}

impl Cursor {
    /// Close the cursor, returning the open test's name and buffered lines.
    fn take(&mut self) -> Option<(String, Vec<String>)> {
        match std::mem::replace(self, Cursor::Idle) {
            Cursor::Idle => None,
            Cursor::Open { name, buffer } => Some((name, buffer)),
        }
    }
}

/// Write the open test's buffered output into its detail, closing the cursor.
fn flush_open_test(result: &mut TestResult, cursor: &mut Cursor) {
    if let Some((name, buffer)) = cursor.take() {
        if !buffer.is_empty() {
            if let Some(detail) = result.test_details.get_mut(&name) {
                detail.output = buffer.join("\n");
            }
        }
    }
}

/// Parse human-readable `go test` console output into a [`TestResult`].
///
/// Produces the same shape as [`crate::parse_event_stream`]. Compiler
/// diagnostic lines (`file.go:10:5: message`) are collected separately and
/// surfaced as a single failing `BuildError` pseudo-test.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if reading from the underlying stream fails.
pub fn parse_console_text(reader: impl Read) -> Result<TestResult, ParseError> {
    let mut result = TestResult::default();
    let mut seen_packages: HashSet<String> = HashSet::new();
    let mut cursor = Cursor::Idle;
    let mut build_errors: Vec<String> = Vec::new();

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(caps) = RUN_RE.captures(trimmed) {
            // A new test opening flushes whatever the previous one captured.
            flush_open_test(&mut result, &mut cursor);
            let name = caps[1].to_string();
            result
                .test_details
                .insert(name.clone(), TestDetail::running());
            cursor = Cursor::Open {
                name,
                buffer: Vec::new(),
            };
            continue;
        }

        if let Some(caps) = PASS_RE.captures(trimmed) {
            close_with_status(&mut result, &mut cursor, &caps, TestStatus::Pass);
            continue;
        }
        if let Some(caps) = FAIL_RE.captures(trimmed) {
            close_with_status(&mut result, &mut cursor, &caps, TestStatus::Fail);
            continue;
        }
        if let Some(caps) = SKIP_RE.captures(trimmed) {
            close_with_status(&mut result, &mut cursor, &caps, TestStatus::Skip);
            continue;
        }

        if let Some(caps) = PKG_OK_RE.captures(trimmed) {
            result.record_package(&mut seen_packages, &caps[1]);
            continue;
        }
        if let Some(caps) = PKG_FAIL_RE.captures(trimmed) {
            result.record_package(&mut seen_packages, &caps[1]);
            continue;
        }

        if BUILD_ERROR_RE.is_match(trimmed) {
            build_errors.push(trimmed.to_string());
            continue;
        }

        // Lone FAIL from the summary block carries no information.
        if trimmed == "FAIL" {
            continue;
        }

        if let Cursor::Open { buffer, .. } = &mut cursor {
            buffer.push(line);
        }
    }

    // A trailing test with no terminal marker still keeps its output.
    flush_open_test(&mut result, &mut cursor);

    if !build_errors.is_empty() {
        debug!(lines = build_errors.len(), "synthesizing build error test");
        result.failed_tests += 1;
        result.failed_test_names.push(BUILD_ERROR_TEST.to_string());
        result.test_details.insert(
            BUILD_ERROR_TEST.to_string(),
            TestDetail {
                status: TestStatus::Fail,
                output: build_errors.join("\n"),
                error: "Build failed".to_string(),
                elapsed: 0.0,
            },
        );
    }

    result.recompute_total();
    Ok(result)
}

/// Handle a terminal marker line: close the cursor and record the outcome.
fn close_with_status(
    result: &mut TestResult,
    cursor: &mut Cursor,
    caps: &regex::Captures<'_>,
    status: TestStatus,
) {
    let test_name = &caps[1];
    let elapsed: f64 = caps[2].parse().unwrap_or(0.0);
    let output = cursor
        .take()
        .map(|(_, buffer)| buffer.join("\n"))
        .unwrap_or_default();
    result.record_terminal(test_name, status, elapsed, output);
}

/// Cheaply check whether a stream looks like `go test` console output.
///
/// Samples up to the first 100 non-blank lines; a single recognized marker
/// is enough to accept the format.
///
/// # Errors
///
/// Returns [`ParseError::Empty`] for input with no non-blank lines,
/// [`ParseError::NotConsoleText`] when no marker is found, or
/// [`ParseError::Io`] on a read failure.
pub fn validate_console_text(reader: impl Read) -> Result<(), ParseError> {
    let mut line_count = 0usize;
    let mut marker_lines = 0usize;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if MARKER_RE.is_match(line) || line == "FAIL" {
            marker_lines += 1;
        }
        if line_count >= SAMPLE_LINES {
            break;
        }
    }

    if line_count == 0 {
        return Err(ParseError::Empty);
    }
    if marker_lines == 0 {
        return Err(ParseError::NotConsoleText);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_single_failing_test() {
        let log = "=== RUN   TestX\n--- FAIL: TestX (0.02s)\nFAIL\nFAIL\texample.com/p\t0.1s";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.failed_tests, 1);
        assert_eq!(result.failed_test_names, vec!["TestX"]);
        assert_eq!(result.detail("TestX").expect("detail").elapsed, 0.02);
        assert_eq!(result.packages, vec!["example.com/p"]);
    }

    #[test]
    fn test_pass_and_skip_markers() {
        let log = "=== RUN   TestA\n--- PASS: TestA (0.01s)\n\
                   === RUN   TestB\n--- SKIP: TestB (0.00s)\n\
                   PASS\nok  \texample.com/p\t0.5s";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.total_tests, 2);
        assert_eq!(result.passed_tests, 1);
        assert_eq!(result.skipped_tests, 1);
        assert_eq!(result.passed_test_names, vec!["TestA"]);
        assert_eq!(result.skipped_test_names, vec!["TestB"]);
        assert_eq!(result.packages, vec!["example.com/p"]);
    }

    #[test]
    fn test_output_lines_attach_to_open_test() {
        let log = "=== RUN   TestWithOutput\n\
                   \tsome log line\n\
                   \tanother line\n\
                   --- FAIL: TestWithOutput (0.03s)";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        let detail = result.detail("TestWithOutput").expect("detail");
        assert_eq!(detail.status, TestStatus::Fail);
        // Raw lines, untrimmed, joined with newlines
        assert_eq!(detail.output, "\tsome log line\n\tanother line");
    }

    #[test]
    fn test_failing_output_feeds_error_extraction() {
        let log = "=== RUN   TestMath\n\
                       main_test.go:12: got 5, want 4\n\
                   --- FAIL: TestMath (0.00s)";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        let detail = result.detail("TestMath").expect("detail");
        assert_eq!(detail.error, "main_test.go:12: got 5, want 4");
    }

    #[test]
    fn test_output_before_terminal_without_run() {
        // Terminal marker with no preceding RUN still counts the test.
        let log = "--- PASS: TestOrphan (0.10s)";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.passed_tests, 1);
        let detail = result.detail("TestOrphan").expect("detail");
        assert_eq!(detail.output, "");
        assert_eq!(detail.elapsed, 0.10);
    }

    #[test]
    fn test_trailing_open_test_keeps_output_uncounted() {
        let log = "=== RUN   TestHung\n\tstill going";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.total_tests, 0);
        let detail = result.detail("TestHung").expect("detail");
        assert_eq!(detail.status, TestStatus::Running);
        assert_eq!(detail.output, "\tstill going");
    }

    #[test]
    fn test_build_errors_become_pseudo_test() {
        let log = "# example.com/p\n\
                   ./main.go:10:2: undefined: foo\n\
                   ./main.go:12:5: undefined: bar\n\
                   FAIL\texample.com/p [build failed]";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.failed_tests, 1);
        assert_eq!(result.failed_test_names, vec!["BuildError"]);

        let detail = result.detail("BuildError").expect("detail");
        assert_eq!(detail.status, TestStatus::Fail);
        assert_eq!(detail.error, "Build failed");
        assert_eq!(
            detail.output,
            "./main.go:10:2: undefined: foo\n./main.go:12:5: undefined: bar"
        );
        assert_eq!(result.packages, vec!["example.com/p"]);
    }

    #[test]
    fn test_cached_package_summary() {
        let log = "=== RUN   TestA\n--- PASS: TestA (0.00s)\nok  \texample.com/p\t(cached)";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.packages, vec!["example.com/p"]);
    }

    #[test]
    fn test_subtest_markers() {
        let log = "=== RUN   TestX\n=== RUN   TestX/case_1\n\
                   --- PASS: TestX/case_1 (0.01s)\n--- PASS: TestX (0.02s)";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.passed_tests, 2);
        assert_eq!(result.passed_test_names, vec!["TestX/case_1", "TestX"]);
    }

    #[test]
    fn test_rerun_overwrites_detail() {
        let log = "=== RUN   TestA\n\tfirst attempt\n=== RUN   TestA\n--- PASS: TestA (0.01s)";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.passed_tests, 1);
        let detail = result.detail("TestA").expect("detail");
        assert_eq!(detail.status, TestStatus::Pass);
    }

    #[test]
    fn test_orphan_output_is_discarded() {
        let log = "stray line with no open test\n--- PASS: TestA (0.01s)";

        let result = parse_console_text(log.as_bytes()).expect("parse");
        assert_eq!(result.detail("TestA").expect("detail").output, "");
    }

    #[test]
    fn test_validate_accepts_console_output() {
        let log = "=== RUN   TestX\n--- PASS: TestX (0.01s)\nok  \tp\t0.1s";
        assert!(validate_console_text(log.as_bytes()).is_ok());
    }

    #[test]
    fn test_validate_single_marker_is_enough() {
        let log = "random noise\nmore noise\n--- FAIL: TestX (0.01s)\neven more noise";
        assert!(validate_console_text(log.as_bytes()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_input() {
        assert!(matches!(
            validate_console_text("".as_bytes()),
            Err(ParseError::Empty)
        ));
        assert!(matches!(
            validate_console_text("\n  \n".as_bytes()),
            Err(ParseError::Empty)
        ));
    }

    #[test]
    fn test_validate_rejects_unmarked_text() {
        let log = "just some\nrandom lines\nwith no markers";
        assert!(matches!(
            validate_console_text(log.as_bytes()),
            Err(ParseError::NotConsoleText)
        ));
    }

    #[test]
    fn test_validate_accepts_bare_fail_line() {
        let log = "noise\nFAIL\nnoise";
        assert!(validate_console_text(log.as_bytes()).is_ok());
    }
}
