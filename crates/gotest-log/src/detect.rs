// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! Format auto-detection
//!
//! Callers that cannot know up front whether a log is a `go test -json`
//! event stream or console text hand a seekable source to
//! [`parse_with_auto_detection`], which samples the content with each
//! format's validator and reruns the matching parser from the start.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::console::{parse_console_text, validate_console_text};
use crate::encoding::normalize;
use crate::error::ParseError;
use crate::event::{parse_event_stream, validate_event_stream};
use crate::result::TestResult;

/// Parse test output without knowing its format up front.
///
/// The structured-event validator is consulted first, then the console-text
/// validator; the matching parser reruns from the start of the stream. The
/// encoding normalizer runs in front of every pass, so UTF-16 input is
/// handled transparently in both validation and parsing.
///
/// # Errors
///
/// Returns [`ParseError::UnknownFormat`] when neither validator accepts
/// the input, or [`ParseError::Io`] on a read or seek failure.
pub fn parse_with_auto_detection<R: Read + Seek>(mut reader: R) -> Result<TestResult, ParseError> {
    reader.seek(SeekFrom::Start(0))?;
    if validate_event_stream(normalize(&mut reader)?).is_ok() {
        debug!("detected go test -json event stream");
        reader.seek(SeekFrom::Start(0))?;
        return parse_event_stream(normalize(&mut reader)?);
    }

    reader.seek(SeekFrom::Start(0))?;
    if validate_console_text(normalize(&mut reader)?).is_ok() {
        debug!("detected go test console output");
        reader.seek(SeekFrom::Start(0))?;
        return parse_console_text(normalize(&mut reader)?);
    }

    Err(ParseError::UnknownFormat)
}
