// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! Error types for gotest-log

use thiserror::Error;

/// Errors that can occur while validating or parsing test logs
#[derive(Debug, Error)]
pub enum ParseError {
    /// Read failure on the underlying stream
    #[error("error reading test log: {0}")]
    Io(#[from] std::io::Error),

    /// The input contained no non-blank lines
    #[error("log is empty")]
    Empty,

    /// The sampled lines do not look like `go test -json` events
    #[error("not go test -json output (valid JSON lines: {valid}/{total})")]
    NotEventStream {
        /// Sampled lines that decoded as event records
        valid: usize,
        /// Total non-blank lines sampled
        total: usize,
    },

    /// The sampled lines contain no recognizable console test markers
    #[error("not go test console output (no test markers found)")]
    NotConsoleText,

    /// Neither format validator accepted the input
    #[error("not valid go test output (neither JSON events nor console text)")]
    UnknownFormat,
}
