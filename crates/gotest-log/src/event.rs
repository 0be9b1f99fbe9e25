//! `go test -json` event-stream parsing
//!
//! The structured format is newline-delimited JSON, one `test2json` event
//! per line. Lifecycle events (`run`, `output`, `pass`, `fail`, `skip`)
//! for each test are folded into a [`TestResult`]; output fragments are
//! buffered per test until its terminal event arrives.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader, Read};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParseError;
use crate::result::{TestDetail, TestResult, TestStatus};

/// Lines sampled by the format validator.
const SAMPLE_LINES: usize = 100;

/// One `test2json` event record, as emitted by `go test -json`.
///
/// Field names mirror the Go schema byte-for-byte. Every field is optional
/// in the stream, so all of them default when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestEvent {
    /// Event timestamp
    #[serde(rename = "Time", skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// Lifecycle action: `run`, `output`, `pass`, `fail`, `skip`, ...
    #[serde(rename = "Action")]
    pub action: String,
    /// Import path of the package the event belongs to
    #[serde(rename = "Package")]
    pub package: String,
    /// Test name; empty for package-level events
    #[serde(rename = "Test")]
    pub test: String,
    /// Output fragment, carrying its own line break
    #[serde(rename = "Output")]
    pub output: String,
    /// Elapsed seconds, reported on terminal events
    #[serde(rename = "Elapsed")]
    pub elapsed: f64,
}

/// Parse a complete `go test -json` stream into a [`TestResult`].
///
/// Lines that do not decode as event records are skipped: compiler
/// banners and other foreign output routinely share the stream with the
/// JSON events, and tolerating them is part of the format's contract.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if reading from the underlying stream fails.
pub fn parse_event_stream(reader: impl Read) -> Result<TestResult, ParseError> {
    let mut result = TestResult::default();
    let mut seen_packages: HashSet<String> = HashSet::new();
    // Output fragments are buffered here until the terminal event tells us
    // how to classify the test they belong to.
    let mut pending_output: HashMap<String, Vec<String>> = HashMap::new();

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: TestEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                debug!(%err, "skipping undecodable line");
                continue;
            }
        };

        result.record_package(&mut seen_packages, &event.package);

        if event.test.is_empty() {
            continue;
        }

        match event.action.as_str() {
            "run" => {
                result
                    .test_details
                    .entry(event.test.clone())
                    .or_insert_with(TestDetail::running);
            }
            "output" => {
                if !event.output.is_empty() {
                    pending_output
                        .entry(event.test.clone())
                        .or_default()
                        .push(event.output);
                }
            }
            action => {
                if let Some(status) = TestStatus::from_terminal_action(action) {
                    // Fragments carry their own line breaks, so they join
                    // with no separator.
                    let output = pending_output
                        .get(&event.test)
                        .map(|fragments| fragments.concat())
                        .unwrap_or_default();
                    result.record_terminal(&event.test, status, event.elapsed, output);
                }
            }
        }
    }

    result.recompute_total();
    Ok(result)
}

/// Cheaply check whether a stream looks like `go test -json` output.
///
/// Samples up to the first 100 non-blank lines and requires at least half
/// of them to decode as event records.
///
/// # Errors
///
/// Returns [`ParseError::Empty`] for input with no non-blank lines,
/// [`ParseError::NotEventStream`] when too few lines decode, or
/// [`ParseError::Io`] on a read failure.
pub fn validate_event_stream(reader: impl Read) -> Result<(), ParseError> {
    let mut line_count = 0usize;
    let mut valid_lines = 0usize;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if serde_json::from_str::<TestEvent>(line).is_ok() {
            valid_lines += 1;
        }
        if line_count >= SAMPLE_LINES {
            break;
        }
    }

    if line_count == 0 {
        return Err(ParseError::Empty);
    }
    if valid_lines < line_count / 2 {
        return Err(ParseError::NotEventStream {
            valid: valid_lines,
            total: line_count,
        });
    }
    Ok(())
}
