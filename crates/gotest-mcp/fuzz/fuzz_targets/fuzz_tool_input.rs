#![no_main]

//! Fuzz target for tool argument parsing
//!
//! This target tests that arbitrary bytes never cause panics when parsed
//! as JSON for tool arguments.

use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

use gotest_mcp::handlers::{QueryInput, TerminateInput, TestDetailsInput, UploadInput};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _: Result<UploadInput, _> = serde_json::from_str(s);
        let _: Result<QueryInput, _> = serde_json::from_str(s);
        let _: Result<TerminateInput, _> = serde_json::from_str(s);
        let _: Result<TestDetailsInput, _> = serde_json::from_str(s);

        let _: Result<Map<String, Value>, _> = serde_json::from_str(s);
    }

    let _: Result<Value, _> = serde_json::from_slice(data);
});
