// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! Fuzz target for the console-text parser

#![no_main]

use libfuzzer_sys::fuzz_target;

use gotest_log::parse_console_text;

fuzz_target!(|data: &[u8]| {
    if let Ok(result) = parse_console_text(data) {
        // The count invariant must hold on every successful parse
        assert_eq!(
            result.total_tests,
            result.passed_tests + result.failed_tests + result.skipped_tests
        );
    }
});
