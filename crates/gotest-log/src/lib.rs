// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! gotest-log: go test output parsing for gotest-mcp
//!
//! This library crate reduces raw `go test` output to a canonical
//! [`TestResult`]: aggregate counts, ordered name lists, and per-test
//! details. Two formats are supported:
//!
//! - the structured event stream produced by `go test -json`
//! - the human-readable console output with `=== RUN`/`--- PASS` markers
//!
//! Input encoding is normalized first (UTF-16 logs from Windows shells are
//! transcoded to UTF-8), and [`parse_with_auto_detection`] picks the right
//! parser for callers that cannot know the format up front.
//!
//! # Example
//!
//! ```
//! use gotest_log::parse_event_stream;
//!
//! let log = r#"{"Action":"run","Package":"example.com/p","Test":"TestOne"}
//! {"Action":"pass","Package":"example.com/p","Test":"TestOne","Elapsed":0.02}"#;
//!
//! let result = parse_event_stream(log.as_bytes()).unwrap();
//! assert_eq!(result.total_tests, 1);
//! assert_eq!(result.passed_tests, 1);
//! ```

pub mod console;
pub mod detect;
pub mod encoding;
pub mod error;
pub mod event;
mod extract;
pub mod result;

pub use console::{parse_console_text, validate_console_text};
pub use detect::parse_with_auto_detection;
pub use error::ParseError;
pub use event::{TestEvent, parse_event_stream, validate_event_stream};
pub use result::{TestDetail, TestResult, TestStatus};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::detect::parse_with_auto_detection;
    pub use crate::error::ParseError;
    pub use crate::result::{TestDetail, TestResult, TestStatus};
}
