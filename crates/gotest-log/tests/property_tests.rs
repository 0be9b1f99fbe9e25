// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! Property-based tests for gotest-log
//!
//! These verify the parser's algebraic guarantees over generated inputs:
//! the count invariant, idempotence, and the encoding round-trip.

use std::io::Read;

use proptest::prelude::*;

use gotest_log::encoding::normalize;
use gotest_log::{parse_console_text, parse_event_stream};

/// A generated terminal action paired with a test name suffix.
fn terminal_actions() -> impl Strategy<Value = Vec<(String, u32)>> {
    prop::collection::vec(
        (
            prop_oneof![
                Just("pass".to_string()),
                Just("fail".to_string()),
                Just("skip".to_string()),
            ],
            0u32..50,
        ),
        0..30,
    )
}

fn event_stream_from(actions: &[(String, u32)]) -> String {
    let mut log = String::new();
    for (i, (action, id)) in actions.iter().enumerate() {
        log.push_str(&format!(
            "{{\"Action\":\"run\",\"Package\":\"example.com/p\",\"Test\":\"Test{id}_{i}\"}}\n"
        ));
        log.push_str(&format!(
            "{{\"Action\":\"{action}\",\"Package\":\"example.com/p\",\"Test\":\"Test{id}_{i}\",\"Elapsed\":0.01}}\n"
        ));
    }
    log
}

proptest! {
    #[test]
    fn count_invariant_holds_for_event_streams(actions in terminal_actions()) {
        let log = event_stream_from(&actions);
        let result = parse_event_stream(log.as_bytes()).expect("parse");

        prop_assert_eq!(
            result.total_tests,
            result.passed_tests + result.failed_tests + result.skipped_tests
        );
        prop_assert_eq!(result.total_tests, actions.len());
    }

    #[test]
    fn event_stream_parsing_is_idempotent(actions in terminal_actions()) {
        let log = event_stream_from(&actions);
        let first = parse_event_stream(log.as_bytes()).expect("parse");
        let second = parse_event_stream(log.as_bytes()).expect("parse");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn noise_lines_never_fail_the_event_parser(
        actions in terminal_actions(),
        noise in prop::collection::vec("[a-zA-Z <>=-]{0,60}", 0..10),
    ) {
        let mut log = event_stream_from(&actions);
        for line in &noise {
            log.push_str(line);
            log.push('\n');
        }
        let result = parse_event_stream(log.as_bytes()).expect("parse");
        prop_assert_eq!(result.total_tests, actions.len());
    }

    #[test]
    fn console_parser_never_panics_on_ascii(input in "[ -~\n]{0,2000}") {
        // Arbitrary printable input must parse into a consistent result
        let result = parse_console_text(input.as_bytes()).expect("parse");
        prop_assert_eq!(
            result.total_tests,
            result.passed_tests + result.failed_tests + result.skipped_tests
        );
    }

    #[test]
    fn ascii_utf8_passes_through_normalizer(input in "[ -~\n]{0,512}") {
        let mut out = String::new();
        normalize(input.as_bytes())
            .expect("normalize")
            .read_to_string(&mut out)
            .expect("read");
        prop_assert_eq!(out, input);
    }

    #[test]
    fn utf16le_with_bom_round_trips(input in "[ -~\n]{0,256}") {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in input.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let mut out = String::new();
        normalize(&bytes[..])
            .expect("normalize")
            .read_to_string(&mut out)
            .expect("read");
        prop_assert_eq!(out, input);
    }

    #[test]
    fn utf16be_with_bom_round_trips(input in "[ -~\n]{0,256}") {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in input.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }

        let mut out = String::new();
        normalize(&bytes[..])
            .expect("normalize")
            .read_to_string(&mut out)
            .expect("read");
        prop_assert_eq!(out, input);
    }
}
