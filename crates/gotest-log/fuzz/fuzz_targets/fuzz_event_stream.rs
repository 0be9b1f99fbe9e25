// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! Fuzz target for the `go test -json` event-stream parser

#![no_main]

use libfuzzer_sys::fuzz_target;

use gotest_log::parse_event_stream;

fuzz_target!(|data: &[u8]| {
    // The parser must never panic; undecodable lines are skipped and
    // invalid UTF-8 surfaces as an ordinary read error.
    let _ = parse_event_stream(data);
});
