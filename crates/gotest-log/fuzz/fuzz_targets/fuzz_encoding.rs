// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! Fuzz target for the encoding normalizer

#![no_main]

use std::io::Read;

use libfuzzer_sys::fuzz_target;

use gotest_log::encoding::normalize;

fuzz_target!(|data: &[u8]| {
    let mut out = Vec::new();
    if let Ok(mut reader) = normalize(data) {
        let _ = reader.read_to_end(&mut out);
    }
});
